//! Terminal output with colored module prefixes.
//!
//! Progress lines go to stdout via [`log!`], warnings to stderr via
//! [`warn!`]. Both take a module prefix followed by a format string:
//!
//! ```ignore
//! log!("posts"; "{} published posts", posts.len());
//! warn!("frontmatter"; "{}: unrecognized key `{}`", file, key);
//! ```

use colored::Colorize;

pub fn log(module: &str, message: &str) {
    println!("{} {}", format!("[{}]", module).green().bold(), message);
}

pub fn warn(module: &str, message: &str) {
    eprintln!("{} {}", format!("[{}]", module).yellow().bold(), message);
}

/// Log a progress message with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a warning with a colored module prefix.
#[macro_export]
macro_rules! warn {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::warn($module, &format!($($arg)*))
    }};
}
