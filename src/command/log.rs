use console::style;

pub fn badge_success() -> String {
    style("[✓]").green().to_string()
}

pub fn badge_pending() -> String {
    style("[…]").color256(208).to_string()
}

pub fn badge_failure() -> String {
    style("[✗]").red().to_string()
}

pub fn print_part_complete(name: &str) {
    println!("{} {}", badge_success(), style(name).italic());
}

pub fn print_part_incomplete(name: &str) {
    println!(
        "{} {} (incomplete, download will resume)",
        badge_pending(),
        style(name).italic()
    );
}

pub fn print_part_missing(name: &str) {
    println!("{} {} (missing)", badge_failure(), style(name).italic());
}

pub fn print_created(path: &str) {
    println!("{} Created {}", badge_success(), style(path).italic());
}

pub fn print_exists(what: &str) {
    println!("{} {} already exists", badge_success(), what);
}

/// Rewrites the current stderr line with the merge percentage.
pub fn print_merge_progress(percent: u64) {
    eprint!("\r{} Merging archive parts: {percent:>3}%", badge_pending());

    if percent >= 100 {
        eprintln!();
    }
}

pub fn print_settings_not_updated(asset_root: &str) {
    println!(
        "{} Isaac Sim settings not updated, assets at {} are not configured",
        badge_failure(),
        style(asset_root).italic()
    );
}

pub fn print_banner(message: &str) {
    println!("{}", style(format!("🎉 {message} 🎉")).green().bold());
}
