//! Tutor 命令行
//!
//! 入口：初始化日志、加载配置、按子命令构建 Agent，对单条输入执行一次并打印强类型输出。
//! `--session` 指定的 JSON 文件作为会话快照读入，成功后写回新快照。

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tutor::agents::{Agent, AgentResponse, AgentVariant};
use tutor::config::load_config;
use tutor::contracts::Difficulty;
use tutor::llm::create_llm_from_config;
use tutor::{
    AgentContext, CoachAgent, LearnerProfile, PipelineSettings, QuizAgent, RecommendAgent,
    SessionState,
};

#[derive(Parser, Debug)]
#[command(name = "tutor", version, about = "Run a tutoring agent once")]
struct Cli {
    /// 额外的配置文件（覆盖 config/default.toml）
    #[arg(long, env = "TUTOR_CONFIG")]
    config: Option<PathBuf>,

    /// 会话快照 JSON 文件；不存在时新建
    #[arg(long)]
    session: Option<PathBuf>,

    #[arg(long, default_value = "local-user")]
    user: String,

    #[arg(long)]
    role: Option<String>,

    #[arg(long)]
    level: Option<String>,

    #[arg(long)]
    topic: Option<String>,

    #[command(subcommand)]
    command: AgentCommand,
}

#[derive(Subcommand, Debug)]
enum AgentCommand {
    /// 评价回答并给出反馈
    Coach { input: String },
    /// 生成单选题
    Quiz {
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[arg(long, value_enum)]
        difficulty: Option<DifficultyArg>,
        #[arg(default_value = "")]
        input: String,
    },
    /// 推荐学习路径
    Recommend {
        #[arg(long, default_value_t = 5)]
        max_items: usize,
        input: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(d: DifficultyArg) -> Self {
        match d {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tutor::observability::init();
    let cli = Cli::parse();

    let cfg = load_config(cli.config.clone()).context("Failed to load config")?;
    let llm = create_llm_from_config(&cfg)?;
    let settings = PipelineSettings::from(&cfg.pipeline);

    let session = match &cli.session {
        Some(path) if path.exists() => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read session {}", path.display()))?;
            serde_json::from_str::<SessionState>(&text).context("Invalid session file")?
        }
        _ => SessionState::new(cli.user.clone()),
    };

    let mut profile = LearnerProfile::new();
    profile.role = cli.role.clone();
    profile.level = cli.level.clone();
    profile.current_topic = cli.topic.clone();
    let context = AgentContext::from_session(profile, &session, settings.history_window);

    let next_session = match &cli.command {
        AgentCommand::Coach { input } => {
            let agent = Agent::new(llm, CoachAgent::from_config(&cfg)?).with_settings(settings);
            run(&agent, input, &context, &session).await?
        }
        AgentCommand::Quiz {
            count,
            difficulty,
            input,
        } => {
            let mut variant = QuizAgent::from_config(&cfg)?.with_question_count(*count);
            if let Some(d) = difficulty {
                variant = variant.with_difficulty((*d).into());
            }
            let agent = Agent::new(llm, variant).with_settings(settings);
            run(&agent, input, &context, &session).await?
        }
        AgentCommand::Recommend { max_items, input } => {
            let variant = RecommendAgent::from_config(&cfg)?.with_max_items(*max_items);
            let agent = Agent::new(llm, variant).with_settings(settings);
            run(&agent, input, &context, &session).await?
        }
    };

    if let Some(path) = &cli.session {
        let text = serde_json::to_string_pretty(&next_session)?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write session {}", path.display()))?;
    }
    Ok(())
}

async fn run<V>(
    agent: &Agent<V>,
    input: &str,
    context: &AgentContext,
    session: &SessionState,
) -> anyhow::Result<SessionState>
where
    V: AgentVariant,
{
    let AgentResponse {
        output,
        session,
        attempts,
    } = agent
        .execute(input, context, session)
        .await
        .context("Agent execution failed")?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    eprintln!("attempts: {}", attempts);
    Ok(session)
}
