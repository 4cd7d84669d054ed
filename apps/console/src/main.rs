use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use client_core::{
    ClientError, EvaluationClient, Evaluator, FlowController, HomeworkServiceClient,
};
use shared::{
    domain::{sort_sessions, HomeworkBoard, HomeworkKind, PatientId, SessionId, SessionOrder},
    protocol::{HomeworkRecord, NewHomework},
    scoring::{EvaluationResult, ScoreBand},
};
use tracing::{debug, info};

mod config;

use config::{load_settings, ConsoleSettings, Overrides};

#[derive(Parser, Debug)]
#[command(about = "Therapist console for the CBT homework services")]
struct Cli {
    #[arg(long, global = true)]
    homework_api: Option<String>,
    #[arg(long, global = true)]
    evaluation_api: Option<String>,
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a homework submission.
    Evaluate(EvaluateArgs),
    /// List homework, optionally for a single patient.
    Homeworks {
        #[arg(long)]
        patient: Option<i64>,
    },
    /// Hand in homework on behalf of a patient.
    Submit {
        #[arg(long)]
        patient: i64,
        #[arg(long)]
        session: Option<i64>,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        content: String,
    },
    /// Create and publish homework for a patient's session.
    Walkthrough {
        #[arg(long)]
        patient: Option<i64>,
        #[arg(long)]
        session: Option<i64>,
        #[arg(long, value_enum)]
        template: Option<TemplateArg>,
        /// Withdraw the homework again while the undo window is open.
        #[arg(long)]
        withdraw: bool,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct EvaluateArgs {
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TemplateArg {
    ThoughtRecord,
    MoodDiary,
    Relaxation,
    BehavioralActivation,
}

impl From<TemplateArg> for HomeworkKind {
    fn from(value: TemplateArg) -> Self {
        match value {
            TemplateArg::ThoughtRecord => HomeworkKind::ThoughtRecord,
            TemplateArg::MoodDiary => HomeworkKind::MoodDiary,
            TemplateArg::Relaxation => HomeworkKind::Relaxation,
            TemplateArg::BehavioralActivation => HomeworkKind::BehavioralActivation,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let settings = load_settings(&Overrides {
        homework_api: cli.homework_api,
        evaluation_api: cli.evaluation_api,
        timeout_ms: cli.timeout_ms,
    })?;
    debug!(?settings, "console settings loaded");

    match cli.command {
        Command::Evaluate(args) => {
            let text = match (args.text, args.file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                (None, None) => bail!("either --text or --file is required"),
            };
            evaluate(&settings, &text).await?;
        }
        Command::Homeworks { patient } => list_homeworks(&settings, patient.map(PatientId)).await?,
        Command::Submit {
            patient,
            session,
            title,
            description,
            content,
        } => {
            let draft = NewHomework::patient_submission(
                PatientId(patient),
                session.map(SessionId),
                title,
                description,
                content,
                Utc::now(),
            );
            let record = homework_client(&settings)?
                .submit_homework(&draft)
                .await
                .map_err(friendly)?;
            println!("stored homework id={} status={}", record.id, record.status.label());
        }
        Command::Walkthrough {
            patient,
            session,
            template,
            withdraw,
        } => {
            walkthrough(
                &settings,
                patient.map(PatientId),
                session.map(SessionId),
                template.map(HomeworkKind::from),
                withdraw,
            )
            .await?
        }
    }

    Ok(())
}

fn homework_client(settings: &ConsoleSettings) -> Result<HomeworkServiceClient> {
    HomeworkServiceClient::with_timeout(
        settings.homework_api_base.as_str(),
        settings.request_timeout,
    )
    .map_err(friendly)
}

fn evaluation_client(settings: &ConsoleSettings) -> Result<EvaluationClient> {
    EvaluationClient::with_timeout(
        settings.evaluation_api_base.as_str(),
        settings.request_timeout,
    )
    .map_err(friendly)
}

fn friendly(err: ClientError) -> anyhow::Error {
    anyhow!("{} ({err})", err.user_message())
}

fn band_label(band: ScoreBand) -> &'static str {
    match band {
        ScoreBand::Good => "good",
        ScoreBand::Fair => "fair",
        ScoreBand::NeedsImprovement => "needs improvement",
    }
}

fn print_evaluation(result: &EvaluationResult) {
    println!(
        "total: {}/100 ({})",
        result.total_score(),
        band_label(result.overall_band())
    );
    for (dimension, score) in result.dimensions() {
        println!(
            "  {:<24} {:>2}/20  {}",
            dimension.label(),
            score,
            band_label(ScoreBand::for_dimension_score(score))
        );
    }
    println!("therapist notes: {}", result.doctor_comments());
    println!("patient feedback: {}", result.patient_feedback());
}

async fn evaluate(settings: &ConsoleSettings, text: &str) -> Result<()> {
    let result = evaluation_client(settings)?
        .evaluate(text)
        .await
        .map_err(friendly)?;
    print_evaluation(&result);
    Ok(())
}

async fn list_homeworks(settings: &ConsoleSettings, patient: Option<PatientId>) -> Result<()> {
    let records = homework_client(settings)?
        .fetch_homeworks(patient)
        .await
        .map_err(friendly)?;

    let print = |record: &HomeworkRecord| {
        println!(
            "#{:<4} patient={} {:<12} due {}  {}",
            record.id,
            record.patient_id,
            record.status.label(),
            record.due_date,
            record.title
        )
    };

    match patient {
        None => records.iter().for_each(print),
        Some(patient_id) => {
            println!("patient {patient_id}: {} homework record(s)", records.len());
            let board = HomeworkBoard::from_homeworks(
                records.into_iter().map(HomeworkRecord::into_homework),
            );
            println!("current:");
            for homework in &board.current {
                println!("  [{}] {}", homework.status.label(), homework.title);
            }
            println!("history:");
            for homework in &board.history {
                println!("  [{}] {}", homework.status.label(), homework.title);
            }
            match board.completion_rate() {
                Some(rate) => println!("completion rate: {rate}%"),
                None => println!("completion rate: n/a"),
            }
        }
    }
    Ok(())
}

async fn walkthrough(
    settings: &ConsoleSettings,
    patient_id: Option<PatientId>,
    session_id: Option<SessionId>,
    template: Option<HomeworkKind>,
    withdraw: bool,
) -> Result<()> {
    let homework_api = homework_client(settings)?;
    let evaluator: Arc<dyn Evaluator> = Arc::new(evaluation_client(settings)?);
    let mut controller = FlowController::new(evaluator);

    let patients = homework_api.list_patients().await.map_err(friendly)?;
    let patient = match patient_id {
        Some(id) => patients.into_iter().find(|patient| patient.id == id),
        None => patients.into_iter().next(),
    }
    .context("no matching patient")?;

    let mut sessions = homework_api
        .list_sessions(patient.id)
        .await
        .map_err(friendly)?;
    sort_sessions(&mut sessions, SessionOrder::NewestFirst);
    let session = match session_id {
        Some(id) => sessions.into_iter().find(|session| session.id == id),
        None => sessions.into_iter().next(),
    }
    .with_context(|| format!("patient {} has no matching session", patient.name))?;

    println!("patient: {} (last session {})", patient.name, patient.last_session);
    println!("session: {} ({} min)", session.date, session.duration_minutes);

    controller.start_create()?;
    controller.pick_patient_for_create(patient)?;
    controller.pick_session(session)?;
    println!("step: {} (generating draft...)", controller.state().step());

    while controller.state().draft_homework().is_none() {
        let outcome = controller
            .next_event()
            .await
            .context("controller stopped before the draft arrived")?;
        debug!(?outcome, "controller event");
    }

    if let Some(kind) = template {
        controller.select_template(kind)?;
    }
    let draft = controller
        .state()
        .draft_homework()
        .cloned()
        .context("draft disappeared")?;
    println!("draft: {}", draft.title);
    println!("  {}", draft.ai_generated);
    if let Some(kind) = HomeworkKind::ALL.iter().find(|kind| kind.title() == draft.title) {
        for (label, example) in kind.example_rows() {
            println!("  {label}: {example}");
        }
    }

    controller.request_preview(draft)?;
    println!("step: {}", controller.state().step());

    let published = controller
        .publish(None)?
        .context("nothing was published")?;
    let notification = controller.state().notification();
    if let Some(kind) = notification.kind {
        println!("{}: {}", kind.title(), kind.subtitle());
    }
    info!(patient = %published.patient.id, title = %published.homework.title, "walkthrough published");

    if withdraw {
        if let Some(withdrawn) = controller.withdraw()? {
            println!("withdrew '{}'", withdrawn.homework.title);
        }
        if let Some(kind) = controller.state().notification().kind {
            println!("{}: {}", kind.title(), kind.subtitle());
        }
    }

    while controller.state().notification().visible {
        controller
            .next_event()
            .await
            .context("controller stopped before the notification expired")?;
    }
    println!("notification dismissed, back at {}", controller.state().step());
    Ok(())
}
