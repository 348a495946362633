use cfgsync_core::diff::DiffPreview;
use cfgsync_core::FileStatus;
use colored::{ColoredString, Colorize};

pub fn print_preview(preview: &DiffPreview) {
    println!("{}", preview.title.bold().cyan());
    println!();

    if preview.is_empty() {
        println!("  {}", "No differences".dimmed());
        return;
    }

    for file in &preview.files {
        println!("{}", "━".repeat(80).bright_black());
        println!("{}", file.path.white().bold());
        println!();

        for line in file.format_unified(3).lines() {
            let color: fn(&str) -> ColoredString = if line.starts_with("+++")
                || line.starts_with("---")
            {
                |s| s.bold()
            } else if line.starts_with('+') {
                |s| s.green()
            } else if line.starts_with('-') {
                |s| s.red()
            } else if line.starts_with("@@") {
                |s| s.cyan()
            } else {
                |s| s.normal()
            };
            println!("{}", color(line));
        }
        println!();
    }
}

pub fn status_label(status: FileStatus) -> ColoredString {
    match status {
        FileStatus::Identical => "up to date".green(),
        FileStatus::WhitespaceOnly => "whitespace only".dimmed(),
        FileStatus::Significant => "modified".yellow(),
    }
}
