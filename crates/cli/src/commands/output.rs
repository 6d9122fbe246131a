//! Plain-text rendering shared by the stats commands

use devstats_domain::{AggregateResult, PlatformStats, Submission};
use time::macros::format_description;

fn timestamp(submission: &Submission) -> String {
    let format =
        format_description!("[year]-[month]-[day] [hour]:[minute] UTC[offset_hour sign:mandatory]");
    submission
        .timestamp
        .format(&format)
        .unwrap_or_else(|_| submission.timestamp.to_string())
}

pub(crate) fn print_stats(stats: &PlatformStats) {
    println!(
        "{} ({})",
        stats.platform.display_name(),
        stats.username
    );
    println!("  Solved: {} / {}", stats.solved, stats.total);
    println!("  Rank:   {}", stats.rank);
    println!("  Rating: {}", stats.rating);

    if !stats.badges.is_empty() {
        println!("  Badges:");
        for badge in &stats.badges {
            let level = badge.level.as_deref().unwrap_or("-");
            match badge.stars {
                Some(stars) => println!(
                    "    - {} [{}] {} stars, {} solved",
                    badge.name, level, stars, badge.solved
                ),
                None => println!("    - {} [{}] {} solved", badge.name, level, badge.solved),
            }
        }
    }

    let months: Vec<String> = stats
        .monthly_progress
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(month, count)| format!("{} {}", month, count))
        .collect();
    if !months.is_empty() {
        println!("  Monthly: {}", months.join(", "));
    }

    if !stats.recent_submissions.is_empty() {
        println!("  Recent:");
        for submission in &stats.recent_submissions {
            println!(
                "    {}  {} [{}] {}",
                timestamp(submission),
                submission.problem,
                submission.difficulty,
                submission.status
            );
        }
    }
}

pub(crate) fn print_aggregate(result: &AggregateResult) {
    println!("Aggregate Stats");
    println!("===============");
    println!();

    if result.is_empty() && result.failures.is_empty() {
        println!("No platform handles configured.");
        return;
    }

    for stats in result.per_platform.values() {
        print_stats(stats);
        println!();
    }

    println!("Total solved: {}", result.total_solved);

    if !result.combined_recent.is_empty() {
        println!();
        println!("Recent activity:");
        for entry in &result.combined_recent {
            println!(
                "  {}  {:<10} {} ({})",
                timestamp(&entry.submission),
                entry.platform.as_str(),
                entry.submission.problem,
                entry.submission.status
            );
        }
    }

    if !result.failures.is_empty() {
        println!();
        println!("Failures:");
        for failure in &result.failures {
            println!("  ✗ {}: {}", failure.platform.display_name(), failure.message);
        }
    }
}
