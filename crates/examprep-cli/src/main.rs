//! examprep CLI: browse the question bank and grade answers.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use examprep_core::model::{OptionLetter, RecordId};

mod commands;

#[derive(Parser)]
#[command(name = "examprep", version, about = "GCE exam preparation: questions and answer grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List exam levels
    Levels {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List subjects for a level
    Subjects {
        /// Level id
        #[arg(long)]
        level: RecordId,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List topics for a subject
    Topics {
        /// Subject id
        #[arg(long)]
        subject: RecordId,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List question types
    QuestionTypes {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the questions of a topic
    Questions {
        /// Topic id
        #[arg(long)]
        topic: RecordId,

        /// Question type name (e.g. "Structural", "MCQ")
        #[arg(long = "type")]
        question_type: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Grade a free-text answer to a structural question
    Evaluate {
        /// Topic the question belongs to
        #[arg(long)]
        topic: Option<RecordId>,

        /// Stored structural question to grade against
        #[arg(long, conflicts_with_all = ["question", "model_answer", "marks"])]
        question_id: Option<RecordId>,

        /// Question text (when not using --question-id)
        #[arg(long)]
        question: Option<String>,

        /// Model answer (when not using --question-id)
        #[arg(long)]
        model_answer: Option<String>,

        /// Mark allocation (when not using --question-id)
        #[arg(long)]
        marks: Option<u32>,

        /// The student's answer
        #[arg(long)]
        answer: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check an MCQ option
    Check {
        /// Topic id
        #[arg(long)]
        topic: RecordId,

        /// Question type name
        #[arg(long = "type", default_value = "MCQ")]
        question_type: String,

        /// Question id
        #[arg(long)]
        question_id: RecordId,

        /// Chosen option (A-D)
        #[arg(long)]
        option: OptionLetter,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examprep=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Levels { config } => commands::catalog::levels(config).await,
        Commands::Subjects { level, config } => commands::catalog::subjects(level, config).await,
        Commands::Topics { subject, config } => commands::catalog::topics(subject, config).await,
        Commands::QuestionTypes { config } => commands::catalog::question_types(config).await,
        Commands::Questions {
            topic,
            question_type,
            config,
        } => commands::questions::execute(topic, question_type, config).await,
        Commands::Evaluate {
            topic,
            question_id,
            question,
            model_answer,
            marks,
            answer,
            format,
            config,
        } => {
            let target = match question_id {
                Some(id) => commands::evaluate::Target::Stored { topic, id },
                None => commands::evaluate::Target::Inline {
                    question: question.unwrap_or_default(),
                    model_answer: model_answer.unwrap_or_default(),
                    marks: marks.unwrap_or_default(),
                },
            };
            commands::evaluate::execute(target, answer, format, config).await
        }
        Commands::Check {
            topic,
            question_type,
            question_id,
            option,
            config,
        } => commands::check::execute(topic, question_type, question_id, option, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
