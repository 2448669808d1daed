use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_VIEWS: usize = 64;

/// Startup settings. Flags win over environment variables.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rosterd",
    version,
    about = "List-view sidecar: search, filter, sort and page record collections over JSON lines"
)]
pub struct Config {
    /// Workspace folder opened before the first request.
    #[arg(long, env = "ROSTERD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Page size for views that do not ask for one.
    #[arg(long, env = "ROSTERD_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub default_page_size: usize,

    /// Upper bound on simultaneously open views.
    #[arg(long, env = "ROSTERD_MAX_VIEWS", default_value_t = DEFAULT_MAX_VIEWS)]
    pub max_views: usize,

    /// tracing filter directive, e.g. `info` or `rosterd=debug`.
    #[arg(long, env = "ROSTERD_LOG", default_value = "warn")]
    pub log: String,
}

impl Config {
    pub fn page_size(&self) -> usize {
        if self.default_page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.default_page_size
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            workspace: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            max_views: DEFAULT_MAX_VIEWS,
            log: "warn".to_string(),
        }
    }
}
