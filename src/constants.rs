#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Platform URLs, wire markers and other fixed values.

/// Name the plugin reports in its user agent.
pub const PLUGIN_NAME: &str = "EduTools";

/// Version reported in the user agent.
pub const PLUGIN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stepik site.
pub const STEPIK_URL: &str = "https://stepik.org";

/// Path of the Stepik REST API under the site URL.
pub const STEPIK_API_PATH: &str = "/api";

/// Stepik endpoint describing the logged-in user.
pub const STEPIK_CURRENT_USER: &str = "/stepics/1";

/// Redirect path registered for the Stepik OAuth client.
pub const STEPIK_OAUTH_PATH: &str = "/api/edu/stepik/oauth";

/// Prefix of Stepik progress ids for steps.
pub const PROGRESS_ID_PREFIX: &str = "77-";

/// Marker appended after a line comment to code posted to Stepik.
pub const EDU_TOOLS_COMMENT: &str = " Posted from EduTools plugin";

/// Course type prefix of courses authored with EduTools.
pub const PYCHARM_PREFIX: &str = "pycharm";

/// Step block name of theory steps.
pub const TEXT_BLOCK: &str = "text";

/// Step block name of choice steps.
pub const CHOICE_BLOCK: &str = "choice";

/// Step block name of code challenge steps.
pub const CODE_BLOCK: &str = "code";

/// CheckiO OAuth server.
pub const CHECKIO_OAUTH_URL: &str = "https://oauth.checkio.org";

/// Redirect path of the CheckiO OAuth clients; platforms append a suffix.
pub const CHECKIO_OAUTH_PATH: &str = "/api/edu/checkio/oauth";

/// Hyperskill site.
pub const HYPERSKILL_URL: &str = "https://hyperskill.org";

/// Redirect path registered for the Hyperskill OAuth client.
pub const HYPERSKILL_OAUTH_PATH: &str = "/api/edu/hyperskill/oauth";

/// Public OAuth client id of the Hyperskill integration.
pub const HYPERSKILL_DEFAULT_CLIENT_ID: &str = "jcboczaSZYHmmCewusCNrE172yHkOONV7JY1ECh4";

/// Where settings live unless configured otherwise.
pub const DEFAULT_SETTINGS_PATH: &str = ".edutools/settings.json";

/// Line comment prefix of `language`.
pub fn line_comment_prefix(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "python" | "python3" | "ruby" | "r" | "shell" => "#",
        "haskell" | "lua" | "sql" => "--",
        _ => "//",
    }
}

/// Name of the single student file of a code challenge in `language`.
pub fn code_file_name(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "python" | "python3" => "main.py",
        "java" => "Main.java",
        "kotlin" => "Main.kt",
        "scala" => "Main.scala",
        "javascript" => "main.js",
        "rust" => "main.rs",
        _ => "main.txt",
    }
}
