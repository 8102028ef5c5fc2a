use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use qanouni::api::ApiClient;
use qanouni::api::types::{
    CaseCreate, CaseUpdate, JurisprudenceRequest, PleadingCaseData, PleadingRequest, QueryRequest,
};
use qanouni::config::ClientConfig;
use qanouni::permissions::{self, RESTRICTED_HINT};
use qanouni::session::{PromptLoginBoundary, Session, SessionGuard, SessionStore};
use qanouni::ui::{self, Theme, View};

#[derive(Parser)]
#[command(
    name = "qanouni",
    version,
    about = "Legal-document assistant client: search, cases, pleadings, jurisprudence and consultations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(flatten)]
    Public(PublicCommand),
    #[command(flatten)]
    Guarded(GuardedCommand),
}

/// Commands that run without a session.
#[derive(Subcommand)]
enum PublicCommand {
    /// Sign in to the backend and store the session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "QANOUNI_PASSWORD")]
        password: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Get or set the display theme (dark/light)
    Theme { value: Option<String> },
}

/// Commands gated behind the restored session and the permission pass.
#[derive(Subcommand)]
enum GuardedCommand {
    /// Show the signed-in user
    Whoami,
    /// Upload legal documents (.txt, .docx, .xlsx)
    Upload {
        files: Vec<PathBuf>,
        /// Document category sent to the ingestion pipeline
        #[arg(long, default_value = "law")]
        doc_type: String,
    },
    /// List uploaded documents
    Documents,
    /// Show a full document, optionally highlighting one chunk
    Show {
        document_id: String,
        #[arg(long)]
        chunk: Option<u32>,
    },
    /// Ask the legal research assistant
    Search { query: Vec<String> },
    /// Manage cases
    Cases {
        #[command(subcommand)]
        action: CaseAction,
    },
    /// Generate a pleading for a case (premium)
    Pleading {
        /// Load facts and parties from a saved case
        #[arg(long)]
        case: Option<String>,
        #[arg(long)]
        facts: Option<String>,
        #[arg(long)]
        defendant: Option<String>,
        #[arg(long)]
        court: Option<String>,
        #[arg(long)]
        case_number: Option<String>,
        #[arg(long)]
        charge: Option<String>,
        #[arg(long, default_value = "défense")]
        pleading_type: String,
        #[arg(long, default_value = "formel")]
        style: String,
    },
    /// Search court jurisprudence (premium)
    Juris {
        issue: Vec<String>,
        #[arg(long)]
        chamber: Option<String>,
    },
    /// Get legal guidance for a situation (premium)
    Consult { situation: Vec<String> },
}

#[derive(Subcommand)]
enum CaseAction {
    /// List your cases
    List,
    /// Register a new case
    New {
        #[arg(long)]
        case_number: String,
        #[arg(long)]
        case_type: String,
        #[arg(long)]
        court: String,
        #[arg(long)]
        defendant: Option<String>,
        #[arg(long)]
        plaintiff: Option<String>,
        /// Comma-separated list of charges
        #[arg(long)]
        charges: Option<String>,
        #[arg(long, default_value = "")]
        facts: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Show one case
    Show { case_id: String },
    /// Update fields of a case
    Edit {
        case_id: String,
        #[arg(long)]
        case_number: Option<String>,
        #[arg(long)]
        case_type: Option<String>,
        #[arg(long)]
        court: Option<String>,
        #[arg(long)]
        defendant: Option<String>,
        #[arg(long)]
        plaintiff: Option<String>,
        /// Comma-separated list of charges
        #[arg(long)]
        charges: Option<String>,
        #[arg(long)]
        facts: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a case
    Delete { case_id: String },
}

fn view_for(command: &GuardedCommand) -> View {
    match command {
        GuardedCommand::Whoami => View::Welcome,
        GuardedCommand::Upload { .. } => View::Upload,
        GuardedCommand::Documents | GuardedCommand::Show { .. } => View::Documents,
        GuardedCommand::Search { .. } => View::Search,
        GuardedCommand::Cases { .. } => View::Cases,
        GuardedCommand::Pleading { .. } => View::Pleading,
        GuardedCommand::Juris { .. } => View::Jurisprudence,
        GuardedCommand::Consult { .. } => View::Consultant,
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("qanouni=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;
    let store = SessionStore::new(&config.data_dir);
    let guard = SessionGuard::new(
        config.api_url.clone(),
        config.request_timeout,
        store.clone(),
        Arc::new(PromptLoginBoundary),
    )?;
    let client = ApiClient::new(guard);
    let theme = ui::load_theme(&store)?;

    // Session-free commands: signing in, signing out, and the display
    // preference, which survives logout.
    let command = match cli.command {
        Command::Public(command) => {
            return match command {
                PublicCommand::Login { username, password } => {
                    let session = client.login(&username, &password).await?;
                    println!(
                        "Signed in as {} ({})",
                        session.identity.display_name(),
                        session.identity.role.label()
                    );
                    Ok(())
                }
                PublicCommand::Logout => {
                    client.logout();
                    println!("Signed out.");
                    Ok(())
                }
                PublicCommand::Theme { value } => handle_theme(&store, value.as_deref()),
            };
        }
        Command::Guarded(command) => command,
    };

    // Load-time gate: no valid session means nothing else runs.
    let Some(session) = Session::restore(&store)? else {
        client.guard().notify_login_required();
        std::process::exit(1);
    };

    // Permission gate, evaluated once from the restored role.
    let role = session.identity.role;
    let mut affordances = ui::default_affordances();
    let requested = view_for(&command);
    let active = permissions::apply(role, &mut affordances, requested);
    if active != requested {
        eprintln!("{RESTRICTED_HINT}.");
        eprintln!("Try `qanouni search <question>` instead.");
        std::process::exit(1);
    }

    match command {
        GuardedCommand::Whoami => {
            println!(
                "{} ({})",
                session.identity.display_name(),
                session.identity.role.label()
            );
        }
        GuardedCommand::Upload { files, doc_type } => {
            handle_upload(&client, files, &doc_type).await?
        }
        GuardedCommand::Documents => handle_documents(&client).await?,
        GuardedCommand::Show { document_id, chunk } => {
            handle_show(&client, theme, &document_id, chunk).await?
        }
        GuardedCommand::Search { query } => handle_search(&client, theme, query).await?,
        GuardedCommand::Cases { action } => handle_cases(&client, theme, action).await?,
        GuardedCommand::Pleading {
            case,
            facts,
            defendant,
            court,
            case_number,
            charge,
            pleading_type,
            style,
        } => {
            handle_pleading(
                &client,
                theme,
                PleadingArgs {
                    case,
                    facts,
                    defendant,
                    court,
                    case_number,
                    charge,
                    pleading_type,
                    style,
                },
            )
            .await?
        }
        GuardedCommand::Juris { issue, chamber } => {
            handle_juris(&client, theme, issue, chamber).await?
        }
        GuardedCommand::Consult { situation } => handle_consult(&client, theme, situation).await?,
    }

    Ok(())
}

fn handle_theme(store: &SessionStore, value: Option<&str>) -> anyhow::Result<()> {
    match value {
        None => println!("{}", ui::load_theme(store)?.as_str()),
        Some(raw) => match Theme::parse(raw) {
            Some(theme) => {
                ui::save_theme(store, theme)?;
                println!("Theme set to {}.", theme.as_str());
            }
            None => bail!("unknown theme '{raw}' (expected 'dark' or 'light')"),
        },
    }
    Ok(())
}

async fn handle_upload(
    client: &ApiClient,
    files: Vec<PathBuf>,
    doc_type: &str,
) -> anyhow::Result<()> {
    if files.is_empty() {
        bail!("no files given");
    }

    println!("Uploading {} file(s)...", files.len());
    let result = client.upload_documents(&files, doc_type).await?;

    if let Some(message) = &result.message {
        println!("{message}");
    }
    for item in &result.data {
        println!(
            "  {} — {}",
            item.filename.as_deref().unwrap_or("(file)"),
            item.status.as_deref().unwrap_or("processed")
        );
    }
    let errors = result.error_count();
    if errors > 0 {
        eprintln!("{errors} file(s) failed to process.");
    }
    Ok(())
}

async fn handle_documents(client: &ApiClient) -> anyhow::Result<()> {
    let documents = client.list_documents().await?;
    if documents.is_empty() {
        println!("No documents uploaded yet.");
        return Ok(());
    }
    for doc in documents {
        let chunks = doc
            .total_chunks
            .map(|c| format!("{c} chunks"))
            .unwrap_or_else(|| "?".to_string());
        let date = doc
            .upload_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("{}  {}  {} {}", doc.id, doc.filename, chunks, date);
    }
    Ok(())
}

async fn handle_show(
    client: &ApiClient,
    theme: Theme,
    document_id: &str,
    chunk: Option<u32>,
) -> anyhow::Result<()> {
    let doc = client.full_document(document_id, chunk).await?;
    println!("# {}\n", doc.document.filename);
    if doc.chunks.is_empty() {
        ui::print_markdown(theme, &doc.full_content);
        return Ok(());
    }
    for part in &doc.chunks {
        if part.highlighted {
            println!(">>> chunk {} <<<", part.index);
        }
        ui::print_markdown(theme, &part.content);
    }
    Ok(())
}

async fn handle_search(client: &ApiClient, theme: Theme, query: Vec<String>) -> anyhow::Result<()> {
    let query = query.join(" ");
    if query.trim().is_empty() {
        bail!("empty query");
    }

    let result = client.query(QueryRequest::new(query)).await?;
    ui::print_markdown(theme, &result.answer);
    ui::print_sources(&result.sources);
    Ok(())
}

async fn handle_cases(client: &ApiClient, theme: Theme, action: CaseAction) -> anyhow::Result<()> {
    match action {
        CaseAction::List => {
            let cases = client.list_cases().await?;
            if cases.is_empty() {
                println!("No cases yet. Add one with `qanouni cases new`.");
                return Ok(());
            }
            for case in cases {
                println!(
                    "{}  {}  {}  {}  [{}]",
                    case.id,
                    case.case_number,
                    case.case_type.as_deref().unwrap_or("-"),
                    case.court.as_deref().unwrap_or("-"),
                    case.status.as_deref().unwrap_or("open"),
                );
            }
        }
        CaseAction::New {
            case_number,
            case_type,
            court,
            defendant,
            plaintiff,
            charges,
            facts,
            notes,
        } => {
            let case = CaseCreate {
                case_number,
                case_type,
                court,
                defendant_name: defendant,
                plaintiff_name: plaintiff,
                charges: split_charges(charges.as_deref()),
                facts,
                notes,
            };
            let message = client.create_case(&case).await?;
            println!("{message}");
        }
        CaseAction::Show { case_id } => {
            let case = client.get_case(&case_id).await?;
            println!("Case {}", case.case_number);
            if let Some(case_type) = &case.case_type {
                println!("Type: {case_type}");
            }
            if let Some(court) = &case.court {
                println!("Court: {court}");
            }
            if let Some(defendant) = &case.defendant_name {
                println!("Defendant: {defendant}");
            }
            if !case.charges.is_empty() {
                let charges: Vec<&str> = case.charges.iter().map(|c| c.text()).collect();
                println!("Charges: {}", charges.join(", "));
            }
            if let Some(facts) = &case.facts {
                println!();
                ui::print_markdown(theme, &facts.to_text());
            }
            if let Some(notes) = &case.notes {
                if !notes.is_empty() {
                    println!("\nNotes: {notes}");
                }
            }
        }
        CaseAction::Edit {
            case_id,
            case_number,
            case_type,
            court,
            defendant,
            plaintiff,
            charges,
            facts,
            notes,
        } => {
            let update = CaseUpdate {
                case_number,
                case_type,
                court,
                defendant_name: defendant,
                plaintiff_name: plaintiff,
                charges: charges.map(|c| split_charges(Some(&c))),
                facts,
                notes,
            };
            let message = client.update_case(&case_id, &update).await?;
            println!("{message}");
        }
        CaseAction::Delete { case_id } => {
            let message = client.delete_case(&case_id).await?;
            println!("{message}");
        }
    }
    Ok(())
}

struct PleadingArgs {
    case: Option<String>,
    facts: Option<String>,
    defendant: Option<String>,
    court: Option<String>,
    case_number: Option<String>,
    charge: Option<String>,
    pleading_type: String,
    style: String,
}

async fn handle_pleading(
    client: &ApiClient,
    theme: Theme,
    args: PleadingArgs,
) -> anyhow::Result<()> {
    let mut facts = args.facts.unwrap_or_default();
    let mut defendant = args.defendant.unwrap_or_default();
    let mut court = args.court.unwrap_or_default();
    let mut case_number = args.case_number.unwrap_or_default();
    let mut charges: Vec<String> = args.charge.into_iter().collect();

    // A saved case pre-fills anything not given on the command line.
    if let Some(case_id) = &args.case {
        let case = client.get_case(case_id).await?;
        if facts.is_empty()
            && let Some(case_facts) = &case.facts
        {
            facts = case_facts.to_text();
        }
        if defendant.is_empty() {
            defendant = case.defendant_name.unwrap_or_default();
        }
        if court.is_empty() {
            court = case.court.unwrap_or_default();
        }
        if case_number.is_empty() {
            case_number = case.case_number;
        }
        if charges.is_empty() {
            charges = case.charges.iter().map(|c| c.text().to_string()).collect();
        }
    }

    if facts.is_empty() && defendant.is_empty() {
        bail!("give case facts or a defendant, or load a saved case with --case");
    }
    if court.is_empty() {
        court = "Criminal court".to_string();
    }

    println!("Generating pleading, this can take a minute...");
    let request = PleadingRequest {
        case_data: PleadingCaseData {
            case_number,
            facts,
            case_type: "criminal".to_string(),
            court,
            defendant_name: defendant,
            charges,
        },
        pleading_type: args.pleading_type,
        style: args.style,
        top_k: 30,
    };
    let result = client.generate_pleading(&request).await?;

    ui::print_markdown(theme, &result.pleading);
    ui::print_sources(&result.sources);
    println!("\n{} source(s) consulted.", result.metadata.total_sources);
    Ok(())
}

async fn handle_juris(
    client: &ApiClient,
    theme: Theme,
    issue: Vec<String>,
    chamber: Option<String>,
) -> anyhow::Result<()> {
    let legal_issue = issue.join(" ");
    if legal_issue.trim().is_empty() {
        bail!("describe the legal issue to search for");
    }

    let request = JurisprudenceRequest {
        legal_issue,
        chamber,
        top_k: 20,
    };
    let result = client.search_jurisprudence(&request).await?;

    ui::print_markdown(theme, &result.analysis);
    ui::print_sources(&result.sources);
    Ok(())
}

async fn handle_consult(
    client: &ApiClient,
    theme: Theme,
    situation: Vec<String>,
) -> anyhow::Result<()> {
    let situation = situation.join(" ");
    println!("Analyzing your situation, this can take a minute...");
    let result = client.consult(&situation).await?;

    ui::print_markdown(theme, &result.consultation);
    ui::print_sources(&result.sources);
    Ok(())
}

fn split_charges(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
