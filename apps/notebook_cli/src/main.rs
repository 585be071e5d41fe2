use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    highlight_ranges, load_settings, normalize_server_url, search::SUMMARY_PREVIEW_CHARS,
    truncate_summary, EntityGateway, MeetingListController, MoveOutcome, NotebookClient,
    SortController,
};
use shared::{
    domain::{Meeting, MeetingId, MoveDirection, Note, NoteId, SortColumn, SortOrder},
    protocol::MeetingInput,
};
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    /// Overrides the server URL from notebook.toml / environment.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Meetings(MeetingsCommand),
    #[command(subcommand)]
    Notes(NotesCommand),
    Search {
        query: String,
    },
    #[command(subcommand)]
    Config(ConfigCommand),
    Whoami,
}

#[derive(Subcommand, Debug)]
enum MeetingsCommand {
    List {
        #[arg(long, value_parser = parse_sort_column)]
        sort: Option<SortColumn>,
        #[arg(long, value_parser = parse_sort_order)]
        order: Option<SortOrder>,
    },
    Show {
        id: i64,
    },
    Create {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        participants: Option<String>,
        #[arg(long)]
        keywords: Option<String>,
    },
    Delete {
        id: i64,
    },
    /// Generates a summary from the meeting's notes.
    Summarize {
        id: i64,
        /// Print the generated summary, then put the previous one back.
        #[arg(long)]
        preview: bool,
    },
}

#[derive(Subcommand, Debug)]
enum NotesCommand {
    List {
        meeting_id: i64,
    },
    Show {
        id: i64,
    },
    Add {
        meeting_id: i64,
        content: String,
    },
    Edit {
        meeting_id: i64,
        id: i64,
        content: String,
    },
    Delete {
        meeting_id: i64,
        id: i64,
    },
    Move {
        meeting_id: i64,
        id: i64,
        direction: Direction,
    },
    Enhance {
        meeting_id: i64,
        id: i64,
        /// Print the enhanced text, then restore the original.
        #[arg(long)]
        preview: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    Show,
    Language { language: String },
    Model { model: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Direction {
    Up,
    Down,
}

impl From<Direction> for MoveDirection {
    fn from(value: Direction) -> Self {
        match value {
            Direction::Up => MoveDirection::Up,
            Direction::Down => MoveDirection::Down,
        }
    }
}

fn parse_sort_column(raw: &str) -> std::result::Result<SortColumn, String> {
    SortColumn::parse(raw).ok_or_else(|| format!("unknown sort column: {raw}"))
}

fn parse_sort_order(raw: &str) -> std::result::Result<SortOrder, String> {
    SortOrder::parse(raw).ok_or_else(|| format!("unknown sort order: {raw}"))
}

fn print_meeting(meeting: &Meeting) {
    println!(
        "{}\t{} {}\t{}",
        meeting.id, meeting.meeting_date, meeting.start_time, meeting.subject
    );
}

fn print_notes(notes: &[Note]) {
    for note in notes {
        println!("{}\t#{}\t{}", note.id, note.note_number, note.content);
    }
}

/// Wraps every match in brackets for terminal output.
fn highlighted(text: &str, query: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for range in highlight_ranges(text, query) {
        out.push_str(&text[last..range.start]);
        out.push('[');
        out.push_str(&text[range.clone()]);
        out.push(']');
        last = range.end;
    }
    out.push_str(&text[last..]);
    out
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    settings.server_url = normalize_server_url(&settings.server_url)?;
    let client = NotebookClient::connect(settings)?;

    match cli.command {
        Command::Meetings(command) => run_meetings(&client, command).await?,
        Command::Notes(command) => run_notes(&client, command).await?,
        Command::Search { query } => {
            let search = client.search();
            search.set_query(query).await.await?;
            let snapshot = search.snapshot().await;
            if let Some(err) = snapshot.status.error() {
                return Err(anyhow!("search failed: {err}"));
            }
            for meeting in &snapshot.results {
                println!(
                    "{}\t{}",
                    meeting.id,
                    highlighted(&meeting.subject, &snapshot.debounced_query)
                );
                if let Some(summary) = &meeting.summary {
                    println!("\t{}", truncate_summary(summary, SUMMARY_PREVIEW_CHARS));
                }
            }
        }
        Command::Config(command) => {
            let prefs = client.preferences(client_core::preferences::DEFAULT_LANGUAGE);
            match command {
                ConfigCommand::Show => {
                    let config = prefs.load_config().await?;
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigCommand::Language { language } => {
                    prefs.set_language(&language).await;
                    println!("language={}", prefs.language().await);
                }
                ConfigCommand::Model { model } => {
                    let mut edited = prefs.load_config().await?;
                    edited.llm_model = model;
                    let saved = prefs.save_config(&edited).await?;
                    println!("llm_model={}", saved.llm_model);
                }
            }
        }
        Command::Whoami => {
            let user = client.gateway().whoami().await?;
            println!("{} <{}> on {}", user.display_name, user.login_name, user.node_name);
        }
    }

    Ok(())
}

async fn run_meetings(client: &NotebookClient, command: MeetingsCommand) -> Result<()> {
    match command {
        MeetingsCommand::List { sort, order } => {
            let defaults = client.settings();
            let sort = SortController::new(
                sort.unwrap_or(defaults.default_sort_column),
                order.unwrap_or(defaults.default_sort_order),
            );
            let meetings = MeetingListController::new(client.gateway(), sort);
            meetings.load().await?;
            for meeting in meetings.items().await {
                print_meeting(&meeting);
            }
        }
        MeetingsCommand::Show { id } => {
            let detail = client.meeting_detail();
            detail.load(MeetingId(id)).await?;
            if let Some(meeting) = detail.entity().await {
                println!("{}", serde_json::to_string_pretty(&meeting)?);
            }
        }
        MeetingsCommand::Create {
            subject,
            date,
            start,
            end,
            participants,
            keywords,
        } => {
            let input = MeetingInput {
                subject,
                meeting_date: date,
                start_time: start,
                end_time: end,
                participants,
                summary: None,
                keywords,
            };
            let created = client.meetings().create(input).await?;
            info!("cli: meeting created id={}", created.id);
            print_meeting(&created);
        }
        MeetingsCommand::Delete { id } => {
            let meetings = client.meetings();
            meetings.remove(MeetingId(id)).await?;
            println!("deleted meeting {id}");
        }
        MeetingsCommand::Summarize { id, preview } => {
            let id = MeetingId(id);
            let detail = client.meeting_detail();
            detail.load(id).await?;
            let summaries = client.summaries(&detail);
            summaries.enhance(id).await?;
            let summary = detail.entity().await.and_then(|m| m.summary);
            println!("{}", summary.unwrap_or_default());
            if preview {
                summaries.undo(id).await?;
                println!("(previous summary restored)");
            }
        }
    }
    Ok(())
}

async fn run_notes(client: &NotebookClient, command: NotesCommand) -> Result<()> {
    match command {
        NotesCommand::List { meeting_id } => {
            let notes = client.notes(MeetingId(meeting_id));
            notes.load().await?;
            print_notes(&notes.items().await);
        }
        NotesCommand::Show { id } => {
            let detail = client.note_detail();
            detail.load(NoteId(id)).await?;
            if let Some(note) = detail.entity().await {
                println!("{}", note.content);
            }
        }
        NotesCommand::Add {
            meeting_id,
            content,
        } => {
            let notes = client.notes(MeetingId(meeting_id));
            let created = notes.create(&content).await?;
            println!("created note {} #{}", created.id, created.note_number);
        }
        NotesCommand::Edit {
            meeting_id,
            id,
            content,
        } => {
            let notes = client.notes(MeetingId(meeting_id));
            notes.update(NoteId(id), &content).await?;
            print_notes(&notes.items().await);
        }
        NotesCommand::Delete { meeting_id, id } => {
            let notes = client.notes(MeetingId(meeting_id));
            notes.remove(NoteId(id)).await?;
            print_notes(&notes.items().await);
        }
        NotesCommand::Move {
            meeting_id,
            id,
            direction,
        } => {
            let notes = client.notes(MeetingId(meeting_id));
            notes.load().await?;
            let reorder = client.reorder(&notes);
            match reorder.move_note(NoteId(id), direction.into()).await? {
                MoveOutcome::Moved => print_notes(&notes.items().await),
                MoveOutcome::AtBoundary => println!("note {id} cannot move further"),
            }
        }
        NotesCommand::Enhance {
            meeting_id,
            id,
            preview,
        } => {
            let id = NoteId(id);
            let notes = client.notes(MeetingId(meeting_id));
            notes.load().await?;
            let enhancer = client.note_enhancement(&notes);
            enhancer.enhance(id).await?;
            let enhanced = notes.find(id).await.map(|n| n.content);
            println!("{}", enhanced.unwrap_or_default());
            if preview {
                enhancer.undo(id).await?;
                println!("(original content restored)");
            }
        }
    }
    Ok(())
}
