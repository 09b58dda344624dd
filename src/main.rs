use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use podshelf::browse::DEFAULT_ORDER;
use podshelf::{
    BrowseQuery, CatalogClient, Config, DashboardError, EpisodeKey, FavoriteEntry,
    FavoritesStore, FileStore, ListenHistory, LocalStorage, Mutation, NoopReporter,
    PlaylistState, ProgressEvent, ProgressReporter, ReqwestClient, SharedProgressReporter,
    Theme, TrackChange, fetch_page, has_completed, load_favorite_seasons, load_listen_history,
    sort_by, track_key,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static STAR: Emoji<'_, '_> = Emoji("⭐ ", "[*] ");
static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PLAY: Emoji<'_, '_> = Emoji("▶️  ", "[>] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");

/// Browse a podcast catalog and keep track of favorites and listening
#[derive(Parser, Debug)]
#[command(name = "podshelf")]
#[command(about = "Browse a podcast catalog and keep track of favorites and listening")]
#[command(version)]
struct Args {
    /// Path to a config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding favorites, history and theme
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Base URL of the catalog API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List shows, filtered, sorted and paged
    Shows {
        /// Only shows of this genre (by title)
        #[arg(short, long)]
        genre: Option<String>,

        /// Only shows whose title contains this text
        #[arg(short, long)]
        title: Option<String>,

        /// a-z, z-a, newest or oldest
        #[arg(short, long, default_value = DEFAULT_ORDER)]
        order: String,

        /// Page to show, starting at 1
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// List every genre
    Genres,

    /// Details and seasons of a show
    Show { id: String },

    /// Episodes of one season
    Season { show_id: String, season: u32 },

    /// Manage favorite episodes
    #[command(subcommand)]
    Favorites(FavoritesCommand),

    /// Favorite seasons, one entry per season
    Dashboard {
        /// a-z, z-a, newest or oldest
        #[arg(short, long, default_value = DEFAULT_ORDER)]
        order: String,
    },

    /// Episodes played to the end
    #[command(subcommand)]
    History(HistoryCommand),

    /// Load a season into the player and move the track pointer
    Play {
        show_id: String,
        season: u32,

        /// Track to start on, starting at 1
        #[arg(short, long, default_value = "1")]
        track: usize,

        /// Skip forward this many tracks
        #[arg(long, default_value = "0")]
        next: usize,

        /// Skip back this many tracks
        #[arg(long, default_value = "0")]
        previous: usize,

        /// Wrap around at the first and last track
        #[arg(long)]
        wrap: bool,

        /// Fraction of the current track already played (0.0 - 1.0)
        #[arg(long)]
        progress: Option<f64>,
    },

    /// Show or toggle the color theme
    Theme {
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// List favorite episodes
    List,
    /// Mark an episode as favorite
    Add(EpisodeArgs),
    /// Remove an episode from the favorites
    Remove(EpisodeArgs),
    /// Flip the favorite state of an episode
    Toggle(EpisodeArgs),
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List listened episodes
    List,
    /// Forget the listen history
    Reset,
}

#[derive(clap::Args, Debug)]
struct EpisodeArgs {
    show_id: String,
    season: u32,
    episode: u32,
}

impl EpisodeArgs {
    fn key(&self) -> EpisodeKey {
        EpisodeKey::new(self.show_id.clone(), self.season, self.episode)
    }
}

/// Progress reporter using an indicatif spinner
struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {wide_msg}")
        {
            bar.set_style(style);
        }
        bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for SpinnerReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingPreviews => {
                self.bar.set_message(format!("{SEARCH}Fetching shows"));
            }

            ProgressEvent::PreviewsFetched { count } => {
                self.bar.set_message(format!(
                    "{HEADPHONES}{} shows in the catalog",
                    count.to_string().cyan()
                ));
            }

            ProgressEvent::ProbingGenre { id } => {
                self.bar
                    .set_message(format!("{SEARCH}Looking up genre {}", id.to_string().cyan()));
            }

            ProgressEvent::GenreScanFinished { found, .. } => {
                self.bar
                    .set_message(format!("{HEADPHONES}{} genres", found.to_string().cyan()));
            }

            ProgressEvent::FetchingShow { show_id } => {
                self.bar
                    .set_message(format!("{SEARCH}Fetching show {}", show_id.cyan()));
            }

            ProgressEvent::ShowUnavailable { show_id, error } => {
                self.bar.println(format!(
                    "{FAILURE}{} {} - {}",
                    "Show unavailable:".red(),
                    show_id.yellow(),
                    error.dimmed()
                ));
            }

            ProgressEvent::AggregationCompleted {
                loaded_count,
                dropped_count,
            } => {
                debug!(loaded_count, dropped_count, "aggregation completed");
            }
        }
    }
}

/// Everything a command needs
struct App {
    config: Config,
    catalog: CatalogClient<ReqwestClient>,
    storage: LocalStorage,
    spinner: Option<Arc<SpinnerReporter>>,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let mut config =
            Config::load(args.config.as_deref()).context("Failed to load configuration")?;

        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(url) = &args.base_url {
            config.api_base_url = url.clone();
        }

        let http = match config.request_timeout() {
            Some(timeout) => {
                ReqwestClient::with_timeout(timeout).context("Failed to build HTTP client")?
            }
            None => ReqwestClient::new(),
        };

        let spinner = (!args.quiet).then(|| Arc::new(SpinnerReporter::new()));
        let reporter: SharedProgressReporter = match &spinner {
            Some(spinner) => spinner.clone(),
            None => NoopReporter::shared(),
        };

        let catalog = CatalogClient::new(http, &config.api_base_url)
            .with_context(|| format!("Invalid catalog URL '{}'", config.api_base_url))?
            .with_reporter(reporter);

        let store = FileStore::open(&config.data_dir).with_context(|| {
            format!(
                "Failed to open data directory {}",
                config.data_dir.display()
            )
        })?;

        Ok(Self {
            config,
            catalog,
            storage: LocalStorage::new(store),
            spinner,
        })
    }

    /// Clear the spinner before printing results
    fn done(&self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish();
        }
    }

    fn favorites(&self) -> FavoritesStore {
        let mut favorites = FavoritesStore::new(self.storage.clone());
        favorites.sync();
        favorites
    }

    fn history(&self) -> ListenHistory {
        ListenHistory::new(self.storage.clone())
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// A token that is cancelled on Ctrl-C
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });

    token
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d %b %y, %H:%M").to_string()
}

fn format_updated(updated: &str) -> String {
    podshelf::catalog::parse_timestamp(updated)
        .map(|dt| dt.format("%d %b %Y").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn list_shows(
    app: &App,
    genre: Option<String>,
    title: Option<String>,
    order: String,
    page: usize,
) -> Result<()> {
    let query = BrowseQuery {
        genre,
        title,
        order,
        page: page.saturating_sub(1),
        per_page: app.config.items_per_page,
    };

    let result = fetch_page(&app.catalog, &query)
        .await
        .context("Failed to fetch preview cards")?;
    app.done();

    if result.items.is_empty() {
        println!("{}", "No shows found".yellow());
        return Ok(());
    }

    for preview in &result.items {
        println!(
            "{} {} {}",
            format!("{:>6}", preview.id).dimmed(),
            truncate_title(&preview.title, 50).bold(),
            format!(
                "({} seasons, updated {})",
                preview.seasons,
                format_updated(&preview.updated)
            )
            .dimmed()
        );
    }

    println!(
        "\nPage {} of {} - {} shows{}",
        (result.page + 1).to_string().cyan(),
        result.page_count.to_string().cyan(),
        result.total.to_string().cyan(),
        if result.has_next {
            format!(", next: --page {}", result.page + 2).dimmed().to_string()
        } else {
            String::new()
        }
    );
    Ok(())
}

async fn list_genres(app: &App) -> Result<()> {
    let genres = app.catalog.fetch_all_genres().await;
    app.done();

    if genres.is_empty() {
        bail!("No genres available");
    }

    for genre in genres {
        println!(
            "{} {} {}",
            format!("{:>3}", genre.id).dimmed(),
            genre.title.bold(),
            format!("({} shows)", genre.shows.len()).dimmed()
        );
    }
    Ok(())
}

async fn show_details(app: &App, id: &str) -> Result<()> {
    let show = app
        .catalog
        .fetch_show(id)
        .await
        .with_context(|| format!("Failed to fetch show {id}"))?;
    app.done();

    println!("{HEADPHONES}{}", show.title.bold().green());
    if !show.genres.is_empty() {
        println!("{}", show.genres.join(", ").cyan());
    }
    println!("Updated {}\n", format_updated(&show.updated));
    println!("{}\n", show.description);

    for season in &show.seasons {
        println!(
            "  {} {} {}",
            format!("{:>2}", season.season).cyan(),
            season.title,
            format!("({} episodes)", season.episodes.len()).dimmed()
        );
    }
    Ok(())
}

async fn season_details(app: &App, show_id: &str, number: u32) -> Result<()> {
    let show = app
        .catalog
        .fetch_show(show_id)
        .await
        .with_context(|| format!("Failed to fetch show {show_id}"))?;
    app.done();

    let Some(season) = show.season_at(number) else {
        bail!("{} has no season {number}", show.title);
    };

    let favorites = app.favorites();
    let favorite_episodes = favorites.episodes_in_season(show_id, number);
    let history = app.history();

    println!("{HEADPHONES}{} - {}\n", show.title.bold(), season.title.green());

    for (index, episode) in season.episodes.iter().enumerate() {
        let key = track_key(show_id, season, index);
        let star = if favorite_episodes.contains(&episode.episode) {
            STAR.to_string()
        } else {
            "   ".to_string()
        };
        let title = if history.is_listened(&key) {
            episode.title.dimmed().to_string()
        } else {
            episode.title.clone()
        };

        println!(
            "{star}{} {title}",
            format!("{:>3}", episode.episode).cyan()
        );
    }
    Ok(())
}

fn favorites_command(app: &App, command: FavoritesCommand) -> Result<()> {
    let mut favorites = app.favorites();

    match command {
        FavoritesCommand::List => {
            if favorites.is_empty() {
                println!("{}", "No favorite shows found".yellow());
            }
            for entry in favorites.entries() {
                println!(
                    "{STAR}show {} season {} episode {} {}",
                    entry.show_id.cyan(),
                    entry.season,
                    entry.episode,
                    format!("(added {})", format_date(&entry.date)).dimmed()
                );
            }
        }

        FavoritesCommand::Add(episode) => {
            let entry = FavoriteEntry::new(episode.show_id.clone(), episode.season, episode.episode);
            match favorites.add(entry) {
                Mutation::Applied => println!("{CHECK}Added to favorites"),
                Mutation::Unchanged(_) => println!("{}", "Already a favorite".yellow()),
            }
        }

        FavoritesCommand::Remove(episode) => match favorites.remove(&episode.key()) {
            Mutation::Applied => println!("{CHECK}Removed from favorites"),
            Mutation::Unchanged(_) => println!("{}", "Not a favorite".yellow()),
        },

        FavoritesCommand::Toggle(episode) => {
            let entry = FavoriteEntry::new(episode.show_id.clone(), episode.season, episode.episode);
            if favorites.toggle(entry) {
                println!("{CHECK}Added to favorites");
            } else {
                println!("{CHECK}Removed from favorites");
            }
        }
    }
    Ok(())
}

async fn dashboard(app: &App, order: &str) -> Result<()> {
    let favorites = app.favorites();
    let cancel = cancel_on_interrupt();

    let result = load_favorite_seasons(&app.catalog, favorites.entries(), &cancel).await;
    app.done();

    let seasons = match result {
        Ok(seasons) => seasons,
        Err(DashboardError::Cancelled) => bail!(DashboardError::Cancelled),
        Err(e) => {
            println!("{}", e.to_string().yellow());
            return Ok(());
        }
    };

    println!("{}\n", "Favorites".bold());
    for favorite in sort_by(seasons, order) {
        println!(
            "{STAR}{} {} {}",
            favorite.season.title.bold(),
            format!("(show {}, {} episodes)", favorite.show_id, favorite.season.episodes.len())
                .dimmed(),
            format!("added {}", format_date(&favorite.date)).dimmed()
        );
    }
    Ok(())
}

async fn history_command(app: &App, command: HistoryCommand) -> Result<()> {
    let history = app.history();

    match command {
        HistoryCommand::List => {
            let cancel = cancel_on_interrupt();
            let result = load_listen_history(&app.catalog, &history.listened(), &cancel).await;
            app.done();

            match result {
                Ok(items) => {
                    for item in items {
                        println!(
                            "{CHECK}{} {} {}",
                            item.show_title.bold(),
                            format!("S{} E{}", item.entry.season, item.entry.episode).cyan(),
                            format_date(&item.entry.date).dimmed()
                        );
                    }
                }
                Err(DashboardError::Cancelled) => bail!(DashboardError::Cancelled),
                Err(e) => println!("{}", e.to_string().yellow()),
            }
        }

        HistoryCommand::Reset => {
            app.done();
            history.reset();
            println!("{CHECK}Listen history reset");
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn play(
    app: &App,
    show_id: &str,
    number: u32,
    track: usize,
    next: usize,
    previous: usize,
    wrap: bool,
    progress: Option<f64>,
) -> Result<()> {
    let show = app
        .catalog
        .fetch_show(show_id)
        .await
        .with_context(|| format!("Failed to fetch show {show_id}"))?;
    app.done();

    let Some(season) = show.season_at(number).cloned() else {
        bail!("{} has no season {number}", show.title);
    };

    let mut playlist = PlaylistState::new();
    playlist.load_season(show_id, season);

    if let TrackChange::Rejected(reason) = playlist.set_track(track.saturating_sub(1)) {
        warn!(?reason, track, "track not selected");
    }

    for _ in 0..next {
        let change = if wrap {
            playlist.next_or_wrap()
        } else {
            playlist.next()
        };
        debug!(?change, "next");
    }
    for _ in 0..previous {
        let change = if wrap {
            playlist.previous_or_wrap()
        } else {
            playlist.previous()
        };
        debug!(?change, "previous");
    }

    let (Some(index), Some(episode)) = (playlist.track_index(), playlist.current_episode()) else {
        bail!("Season {number} of {} has no episodes", show.title);
    };

    println!(
        "{PLAY}{} {} {}",
        format!("[{}/{}]", index + 1, playlist.episode_count()).cyan(),
        episode.title.bold(),
        format!("({})", show.title).dimmed()
    );
    println!("{FOLDER}{}", episode.file.dimmed());

    if let Some(progress) = progress
        && has_completed(progress, 1.0)
        && let Some(entry) = playlist.listened_entry(Utc::now())
    {
        app.history().record_listened(entry);
        println!("{CHECK}Marked as listened");
    }
    Ok(())
}

fn theme_command(app: &App, toggle: bool) -> Result<()> {
    app.done();

    let theme = if toggle {
        Theme::toggle(&app.storage)
    } else {
        Theme::load_or(&app.storage, Theme::default())
    };

    println!("Theme: {}", theme.to_string().cyan());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podshelf".bold().magenta(),
            "- Podcast Shelf".dimmed()
        );
    }

    let app = App::new(&args)?;

    let result = match args.command {
        Command::Shows {
            genre,
            title,
            order,
            page,
        } => list_shows(&app, genre, title, order, page).await,
        Command::Genres => list_genres(&app).await,
        Command::Show { id } => show_details(&app, &id).await,
        Command::Season { show_id, season } => season_details(&app, &show_id, season).await,
        Command::Favorites(command) => {
            app.done();
            favorites_command(&app, command)
        }
        Command::Dashboard { order } => dashboard(&app, &order).await,
        Command::History(command) => history_command(&app, command).await,
        Command::Play {
            show_id,
            season,
            track,
            next,
            previous,
            wrap,
            progress,
        } => {
            play(
                &app, &show_id, season, track, next, previous, wrap, progress,
            )
            .await
        }
        Command::Theme { toggle } => theme_command(&app, toggle),
    };

    app.done();
    result
}
