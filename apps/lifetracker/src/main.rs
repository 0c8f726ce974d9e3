//! LifeTracker command line client
//!
//! Signs in against the LifeTracker API, prints summaries, reads books page
//! by page, and logs Spotify listening.

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lifetracker::api::{ApiClient, SessionStore};
use lifetracker::playback::{IntervalTicker, NowPlayingPoller, PollExit, RemotePlayback};
use lifetracker::resources::{spotify, AuthApi, BooksApi, DashboardApi, SpotifyApi};
use lifetracker::Config;

#[derive(Parser)]
#[command(name = "lifetracker", version, about = "LifeTracker command line client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        email: String,
        /// Falls back to LIFETRACKER_PASSWORD
        #[arg(short, long, env = "LIFETRACKER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Dashboard totals and recent activity
    Dashboard,
    /// List books with reading progress
    Books,
    /// Render pages of a book to PNG files
    #[cfg(feature = "render-mupdf")]
    Read {
        /// Book id
        id: String,
        /// Number of pages to advance after the current one
        #[arg(short = 'n', long, default_value_t = 0)]
        advance: u32,
        #[arg(short, long, default_value = ".")]
        out: std::path::PathBuf,
    },
    /// Log what is playing on Spotify
    Listen {
        /// Authorization code from the Spotify callback
        #[arg(long)]
        code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifetracker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    tracing::debug!("API: {}", config.api.base_url);

    let session = Arc::new(
        SessionStore::open(&config.session.file)
            .with_context(|| format!("opening {}", config.session.file.display()))?,
    );
    let client = ApiClient::new(&config.api, session.user_credentials())?;

    match cli.command {
        Command::Login { email, password } => {
            let user = AuthApi::new(&client).login(&email, &password).await?;
            println!("Signed in as {}", user.display_name());
            session.sign_in(user)?;
        }
        Command::Logout => {
            session.sign_out()?;
            println!("Signed out");
        }
        Command::Whoami => {
            require_user(&session)?;
            let user = AuthApi::new(&client).current_user().await?;
            let name = [user.first_name, user.last_name]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            println!("{} <{}>", name, user.email.unwrap_or_default());
        }
        Command::Dashboard => {
            require_user(&session)?;
            let (stats, activity) = DashboardApi::new(&client).overview().await?;
            println!("Tracks logged:    {}", stats.music_count);
            println!("Books:            {}", stats.books_count);
            println!("Expenses:         ${:.2}", stats.expenses_total);
            println!("Goals completed:  {:.0}%", stats.goals_completion_rate);
            if !activity.is_empty() {
                println!();
                for entry in activity {
                    println!("[{}] {}", entry.kind, entry.description);
                }
            }
        }
        Command::Books => {
            require_user(&session)?;
            let (books, stats) = BooksApi::new(&client).overview().await?;
            println!(
                "{} reading, {} finished this year",
                stats.currently_reading, stats.completed_this_year
            );
            for book in books {
                let progress = match (book.percent_complete(), book.total_pages) {
                    (Some(pct), Some(total)) => format!("{}/{} ({:.0}%)", book.current_page, total, pct),
                    _ => format!("page {}", book.current_page),
                };
                println!("{:>5}  {:<40} {:<10} {}", book.id, book.title, book.status.as_str(), progress);
            }
        }
        #[cfg(feature = "render-mupdf")]
        Command::Read { id, advance, out } => {
            require_user(&session)?;
            read(client, &id, advance, &out).await?;
        }
        Command::Listen { code } => {
            require_user(&session)?;
            listen(&config, &client, &session, code).await?;
        }
    }

    Ok(())
}

fn require_user(session: &SessionStore) -> anyhow::Result<()> {
    if session.user().is_none() {
        bail!("Not signed in. Run `lifetracker login` first.");
    }
    Ok(())
}

#[cfg(feature = "render-mupdf")]
async fn read(client: ApiClient, id: &str, advance: u32, out: &std::path::Path) -> anyhow::Result<()> {
    use lifetracker::document::{
        DocumentKind, DocumentViewController, NavigationOutcome, RemoteDocumentStore, Surface,
    };
    use lifetracker::formats::pdf::MupdfRenderer;

    let store = Arc::new(RemoteDocumentStore::new(client));
    let mut view = DocumentViewController::new(store, Arc::new(MupdfRenderer::new()));

    if let Err(e) = view.open_document(id).await {
        bail!("{}", e.user_message());
    }
    if view.kind() == Some(DocumentKind::Embedded) {
        println!("Not a PDF; open {}", view.embed_url().unwrap_or("(no file)"));
        return Ok(());
    }

    std::fs::create_dir_all(out)?;
    let surface = Surface::new(0, 0);
    if let Err(e) = view.render_current_page(&surface).await {
        bail!("{}", e.user_message());
    }

    let mut page = view.current_page();
    save_page(&surface, out, page)?;

    for _ in 0..advance {
        match view.go_to_next_page().await {
            Ok(NavigationOutcome::Moved { page: moved, .. }) => {
                page = Some(moved);
                save_page(&surface, out, page)?;
            }
            Ok(NavigationOutcome::Unchanged) => {
                println!("No further pages");
                break;
            }
            Err(e) => bail!("{}", e.user_message()),
        }
    }

    view.close().await;
    Ok(())
}

#[cfg(feature = "render-mupdf")]
fn save_page(
    surface: &lifetracker::document::Surface,
    out: &std::path::Path,
    page: Option<lifetracker::document::PageIndex>,
) -> anyhow::Result<()> {
    let page = page.context("no page open")?;
    let path = out.join(format!("page-{:04}.png", page.get()));
    surface.save_png(&path)?;
    println!("Page {} -> {}", page, path.display());
    Ok(())
}

async fn listen(
    config: &Config,
    client: &ApiClient,
    session: &Arc<SessionStore>,
    code: Option<String>,
) -> anyhow::Result<()> {
    if let Some(code) = code {
        let token = SpotifyApi::new(client)
            .exchange_code(&code, &config.spotify.redirect_uri)
            .await?;
        session.set_spotify_token(Some(token))?;
        println!("Spotify connected");
    }

    if session.spotify_token().is_none() {
        match &config.spotify.client_id {
            Some(client_id) => {
                println!("Connect Spotify by opening:");
                println!("{}", spotify::authorize_url(client_id, &config.spotify.redirect_uri));
                println!("then run `lifetracker listen --code <code>`");
                return Ok(());
            }
            None => bail!("Spotify is not connected and SPOTIFY_CLIENT_ID is not set"),
        }
    }

    let playback = Arc::new(RemotePlayback::new(
        client.with_credentials(session.spotify_credentials()),
        client.clone(),
    ));
    let mut poller = NowPlayingPoller::new(
        playback.clone(),
        playback,
        IntervalTicker::new(config.spotify.poll_interval()),
    );

    let mut current = poller.subscribe();
    tokio::spawn(async move {
        while current.changed().await.is_ok() {
            if let Some(item) = current.borrow_and_update().as_ref() {
                tracing::info!(
                    "Now playing: {} - {}",
                    item.name,
                    item.first_artist().unwrap_or("Unknown Artist")
                );
            }
        }
    });

    tracing::info!("Listening for Spotify playback, Ctrl+C to stop");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match poller.run_with_session(session, shutdown).await? {
        PollExit::Unauthorized => {
            bail!("Spotify session expired; run `lifetracker listen` to reconnect");
        }
        PollExit::Stopped => println!("Stopped"),
    }
    Ok(())
}
