//! `live-viewer`: follow a course's live classes from the terminal.
//!
//! Prints the live panel, joins on request, keeps the attendance heartbeat
//! running and leaves on Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use live_classroom::application::dto::request::{CreateTicketRequest, PageContext};
use live_classroom::client::{
    ApiClient, ClientSettings, HelpWidget, JoinOutcome, LiveClassController, LiveEvent,
    LivePanel, LogLauncher, RealtimeListener, SupportApi,
};
use live_classroom::domain::TicketStatus;

#[derive(Debug, Parser)]
#[command(name = "live-viewer", version, about = "Live classroom learner client")]
struct Cli {
    /// REST base URL, e.g. http://localhost:3000/api/v1
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Gateway URL, e.g. ws://localhost:3000/gateway
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Bearer token of the learner
    #[arg(long, global = true, env = "LIVE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show a course's live class and follow its start/end events
    Watch {
        /// Course slug
        course: String,
        /// Join as soon as a class is live
        #[arg(long)]
        join: bool,
    },
    /// Ask the help assistant
    Ask {
        /// Question text
        #[arg(required = true)]
        message: Vec<String>,
        /// Course page the question is about
        #[arg(long)]
        course: Option<String>,
    },
    /// Support tickets
    Tickets {
        #[command(subcommand)]
        command: TicketCommand,
    },
}

#[derive(Debug, Subcommand)]
enum TicketCommand {
    /// List own tickets
    List {
        /// Filter by status (not_opened, opened, in_progress, pending_confirmation, closed)
        #[arg(long)]
        status: Option<String>,
    },
    /// Open a new ticket
    Create {
        subject: String,
        description: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },
    /// Show a ticket thread
    Show { id: Uuid },
    /// Follow up on a ticket
    Reply { id: Uuid, body: String },
    /// Close a ticket
    Close { id: Uuid },
}

impl Cli {
    fn settings(&self) -> anyhow::Result<ClientSettings> {
        let mut settings = ClientSettings::load().context("Failed to load client settings")?;
        if let Some(url) = &self.api_url {
            settings.api_url = url.clone();
        }
        if let Some(url) = &self.gateway_url {
            settings.gateway_url = url.clone();
        }
        if self.token.is_some() {
            settings.token = self.token.clone();
        }
        Ok(settings)
    }

    async fn execute(self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        match self.command {
            Command::Watch { course, join } => watch(&settings, &course, join).await,
            Command::Ask { message, course } => ask(&settings, &message.join(" "), course).await,
            Command::Tickets { command } => tickets(&settings, command).await,
        }
    }
}

#[tokio::main]
async fn main() {
    live_classroom::telemetry::init_tracing_with("pretty", "warn,live_classroom=info");

    let cli = Cli::parse();

    if let Err(e) = cli.execute().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn print_panel(panel: &LivePanel) {
    println!("{}", panel.headline());
    if let LivePanel::Session { session, joined, stats } = panel {
        if let Some(start) = session.actual_start {
            println!("  started {}", start.format("%Y-%m-%d %H:%M UTC"));
        }
        if *joined {
            let stats = stats.unwrap_or_default();
            println!(
                "  attendance {:.1} min ({}%)",
                stats.watch_minutes(),
                stats.attendance_percentage
            );
        }
    }
}

fn print_notification(controller: &LiveClassController<ApiClient>) {
    if let Some(notification) = controller.notification() {
        println!("[{:?}] {}", notification.kind, notification.message);
    }
}

async fn join(controller: &LiveClassController<ApiClient>) {
    match controller.join().await {
        JoinOutcome::Joined { launch_url, .. } => {
            if let Some(url) = launch_url {
                println!("Open the meeting: {url}");
            }
        }
        JoinOutcome::SignInRequired { return_to } => {
            println!("Sign in first (pass --token), then return to {return_to}");
        }
        JoinOutcome::NoActiveSession | JoinOutcome::NotEnrolled | JoinOutcome::Failed { .. } => {}
    }
    print_notification(controller);
}

async fn watch(settings: &ClientSettings, course: &str, auto_join: bool) -> anyhow::Result<()> {
    let api = Arc::new(ApiClient::new(settings)?);
    let controller = LiveClassController::new(api, Arc::new(LogLauncher), settings);

    // Follow the room before fetching so no start between the two is missed.
    let listener = RealtimeListener::new(&settings.gateway_url, settings.token().map(str::to_string))?;
    let mut subscription = listener
        .connect(course)
        .await
        .context("Failed to connect to the gateway")?;

    controller.open_course(course).await;
    print_panel(&controller.panel());
    if auto_join && controller.active_session().is_some() {
        join(&controller).await;
    }

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut status = tokio::time::interval(Duration::from_millis(settings.ping_interval_ms.max(1000)));
    status.tick().await;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                println!("Leaving...");
                break;
            }
            event = subscription.events.recv() => {
                let Some(event) = event else {
                    tracing::warn!("Gateway connection closed");
                    break;
                };
                let started = matches!(event, LiveEvent::Started(_));
                controller.handle_event(event);
                print_notification(&controller);
                print_panel(&controller.panel());
                if started && auto_join {
                    join(&controller).await;
                }
            }
            _ = status.tick() => {
                if controller.joined_session_id().is_some() {
                    print_panel(&controller.panel());
                }
            }
        }
    }

    if let Some(stats) = controller.leave().await {
        println!(
            "Recorded {:.1} min ({}%)",
            stats.watch_minutes(),
            stats.attendance_percentage
        );
    }
    controller.shutdown().await;
    Ok(())
}

async fn ask(settings: &ClientSettings, message: &str, course: Option<String>) -> anyhow::Result<()> {
    let widget = HelpWidget::new(Arc::new(ApiClient::new(settings)?));
    if let Some(slug) = course {
        widget.set_page(PageContext {
            path: format!("/our-courses/{slug}"),
            title: slug.clone(),
            course_slug: Some(slug),
        });
    }
    if let Some(reply) = widget.ask(message).await {
        println!("{reply}");
    }
    Ok(())
}

async fn tickets(settings: &ClientSettings, command: TicketCommand) -> anyhow::Result<()> {
    let api = Arc::new(ApiClient::new(settings)?);
    let widget = HelpWidget::new(api.clone());

    match command {
        TicketCommand::List { status } => {
            let status = status
                .map(|s| TicketStatus::parse(&s).with_context(|| format!("Unknown status: {s}")))
                .transpose()?;
            widget.refresh_tickets(status).await?;
            for ticket in widget.tickets() {
                println!(
                    "{}  {:<22} {:<10} {}",
                    ticket.id,
                    ticket.status.as_str(),
                    ticket.priority.as_str(),
                    ticket.subject
                );
            }
        }
        TicketCommand::Create { subject, description, category, priority } => {
            let id = widget
                .create_ticket(CreateTicketRequest {
                    subject,
                    description,
                    category,
                    priority,
                })
                .await?;
            println!("Created ticket {id}");
        }
        TicketCommand::Show { id } => {
            widget.open(id).await?;
            if let Some(detail) = widget.open_ticket() {
                println!("{} [{}]", detail.ticket.subject, detail.ticket.status.as_str());
                for message in detail.messages {
                    println!(
                        "{} {}: {}",
                        message.created_at.format("%Y-%m-%d %H:%M"),
                        message.author_type.as_str(),
                        message.body
                    );
                }
            }
        }
        TicketCommand::Reply { id, body } => {
            let posted = api.post_message(id, &body).await?;
            println!("Ticket is now {}", posted.ticket.status.as_str());
        }
        TicketCommand::Close { id } => {
            let closed = widget.close(id).await?;
            println!("Ticket {} closed at {}", closed.id, closed.updated_at.format("%Y-%m-%d %H:%M"));
        }
    }
    Ok(())
}
