//! Terminal styling utilities

/// Longest name shown in a ranking table before it is cut
pub const MAX_NAME_LENGTH: usize = 16;

pub fn style_cyan(s: &str) -> String {
    format!("\x1b[36m{}\x1b[0m", s)
}

pub fn style_green(s: &str) -> String {
    format!("\x1b[32m{}\x1b[0m", s)
}

pub fn style_red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}

pub fn style_yellow(s: &str) -> String {
    format!("\x1b[33m{}\x1b[0m", s)
}

pub fn style_dim(s: &str) -> String {
    format!("\x1b[2m{}\x1b[0m", s)
}

pub fn style_bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

pub fn print_success(msg: &str) {
    println!("{} {}", style_green("✓"), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", style_red("✗"), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", style_cyan("ℹ"), msg);
}

pub fn print_header(title: &str) {
    println!();
    println!("{}", style_bold(title));
    println!("{}", "─".repeat(title.chars().count()));
}

/// Cut a display name to [`MAX_NAME_LENGTH`] characters, marking the cut with "...".
/// Stored names are never shortened, only their display.
pub fn trim_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_LENGTH {
        return name.to_string();
    }
    let head: String = name.chars().take(MAX_NAME_LENGTH).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_name_short() {
        assert_eq!(trim_name("Ellen"), "Ellen");
        assert_eq!(trim_name("exactly16chars!!"), "exactly16chars!!");
    }

    #[test]
    fn test_trim_name_long() {
        assert_eq!(trim_name("a-very-long-player-name"), "a-very-long-play...");
    }

    #[test]
    fn test_trim_name_multibyte() {
        let name = "é".repeat(20);
        assert_eq!(trim_name(&name), format!("{}...", "é".repeat(16)));
    }
}
