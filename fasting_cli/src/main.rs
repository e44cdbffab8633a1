use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Weekday};
use clap::{Args, Parser, Subcommand};
use fasting_core::calendar::{calendar_grid, parse_day_key, WEEKDAY_LABELS};
use fasting_core::catalog::{difficulty_label, goal_for, recommended_start_hour, Chronotype, FEELINGS};
use fasting_core::day_cell::CellRole;
use fasting_core::filter::{calendar_view, history_view, matches_fast, summarize_view, ProtocolFilter, StatusFilter};
use fasting_core::heatmap::{yearly_heatmap, HeatCell};
use fasting_core::temporal::{countdown, format_hms, progress};
use fasting_core::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "fastplan")]
#[command(about = "Intermittent fasting planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pretend the current local time is YYYY-MM-DDTHH:MM
    #[arg(long, global = true, value_parser = parse_now)]
    now: Option<NaiveDateTime>,
}

#[derive(Args, Clone, Copy, Debug)]
struct FilterArgs {
    /// Only show fasts of this length (e.g. 16 or 16h), or "all"
    #[arg(long, default_value = "all")]
    protocol: ProtocolFilter,

    /// all, completed or uncompleted
    #[arg(long, default_value = "all")]
    status: StatusFilter,
}

impl From<FilterArgs> for Filters {
    fn from(args: FilterArgs) -> Self {
        Filters {
            protocol: args.protocol,
            status: args.status,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply recurring settings to a month (days before today are left alone)
    Plan {
        /// Month to plan (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<YearMonth>,

        /// Fasting length in hours (12, 16, 24, 36, 48, 72)
        #[arg(long)]
        protocol: Option<Protocol>,

        /// daily, every-other-day, weekly or custom
        #[arg(long)]
        frequency: Option<Frequency>,

        /// Weekdays for the custom frequency, comma separated (mon,wed,fri)
        #[arg(long, value_delimiter = ',', value_parser = parse_weekday)]
        days: Option<Vec<Weekday>>,

        /// Start time (HH:MM)
        #[arg(long, conflicts_with = "chronotype")]
        time: Option<StartTime>,

        /// Pick the start time recommended for this chronotype
        #[arg(long)]
        chronotype: Option<Chronotype>,
    },

    /// Plan or re-plan a single day
    Set {
        #[arg(value_parser = parse_day)]
        day: NaiveDate,

        #[arg(long)]
        protocol: Option<Protocol>,

        #[arg(long)]
        time: Option<StartTime>,
    },

    /// Mark a day as not fasting
    Clear {
        #[arg(value_parser = parse_day)]
        day: NaiveDate,
    },

    /// Mark a fast as completed with how it felt
    Complete {
        #[arg(value_parser = parse_day)]
        day: NaiveDate,

        /// 1 (very easy) to 5 (very hard)
        #[arg(long, default_value_t = 3)]
        difficulty: u8,

        #[arg(long, default_value = "😊")]
        feeling: String,

        #[arg(long)]
        note: Option<String>,
    },

    /// Mark a completed fast as not completed
    Uncomplete {
        #[arg(value_parser = parse_day)]
        day: NaiveDate,
    },

    /// Delete the whole plan
    Reset {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show the running or next fast (default)
    Status {
        /// Refresh once per second
        #[arg(long)]
        watch: bool,

        /// Stop watching after this many refreshes
        #[arg(long, requires = "watch")]
        ticks: Option<u32>,
    },

    /// Show a month as a calendar grid
    Calendar {
        #[arg(long)]
        month: Option<YearMonth>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List past fasts, newest first
    History {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Statistics over completed fasts
    Stats {
        /// Window in days (7 or 30)
        #[arg(long, value_parser = parse_window)]
        window: Option<u32>,

        /// Print a shareable text report
        #[arg(long)]
        share: bool,
    },

    /// Show a year as a heatmap
    Heatmap {
        #[arg(long)]
        year: Option<i32>,
    },

    /// Export a month to an iCalendar file
    Export {
        #[arg(long)]
        month: Option<YearMonth>,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Export fasts to a CSV file
    ExportCsv {
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Suggest a start time for a protocol and chronotype
    Recommend {
        #[arg(long)]
        protocol: Option<Protocol>,

        #[arg(long)]
        chronotype: Chronotype,
    },
}

/// Source of the current time
#[derive(Clone, Copy, Debug)]
enum Clock {
    System,
    Fixed(NaiveDateTime),
}

impl Clock {
    fn now(self) -> NaiveDateTime {
        self.after(std::time::Duration::ZERO)
    }

    /// The time once `elapsed` has passed since the command started
    fn after(self, elapsed: std::time::Duration) -> NaiveDateTime {
        match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(base) => {
                base + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
            }
        }
    }
}

struct Context {
    config: Config,
    data_dir: PathBuf,
    plan_path: PathBuf,
    clock: Clock,
}

fn main() -> Result<()> {
    fasting_core::logging::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let ctx = Context {
        plan_path: data_dir.join("plan.json"),
        data_dir,
        config,
        clock: cli.now.map_or(Clock::System, Clock::Fixed),
    };
    tracing::debug!(
        "Running {:?} against {:?} with {:?} clock",
        cli.command,
        ctx.plan_path,
        ctx.clock
    );

    match cli.command {
        Some(Commands::Plan {
            month,
            protocol,
            frequency,
            days,
            time,
            chronotype,
        }) => cmd_plan(&ctx, month, protocol, frequency, days, time, chronotype),
        Some(Commands::Set {
            day,
            protocol,
            time,
        }) => cmd_set(&ctx, day, protocol, time),
        Some(Commands::Clear { day }) => cmd_clear(&ctx, day),
        Some(Commands::Complete {
            day,
            difficulty,
            feeling,
            note,
        }) => cmd_complete(&ctx, day, difficulty, feeling, note),
        Some(Commands::Uncomplete { day }) => cmd_uncomplete(&ctx, day),
        Some(Commands::Reset { yes }) => cmd_reset(&ctx, yes),
        Some(Commands::Status { watch, ticks }) => cmd_status(&ctx, watch, ticks),
        Some(Commands::Calendar { month, filters }) => cmd_calendar(&ctx, month, filters.into()),
        Some(Commands::History { filters }) => cmd_history(&ctx, filters.into()),
        Some(Commands::Stats { window, share }) => cmd_stats(&ctx, window, share),
        Some(Commands::Heatmap { year }) => cmd_heatmap(&ctx, year),
        Some(Commands::Export { month, output }) => cmd_export(&ctx, month, output),
        Some(Commands::ExportCsv { output, filters }) => cmd_export_csv(&ctx, output, filters.into()),
        Some(Commands::Recommend {
            protocol,
            chronotype,
        }) => cmd_recommend(&ctx, protocol, chronotype),
        None => {
            // Default to "status" command
            cmd_status(&ctx, false, None)
        }
    }
}

// ============================================================================
// Argument parsers
// ============================================================================

fn parse_day(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_day_key(s).map_err(|e| e.to_string())
}

fn parse_now(s: &str) -> std::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M")
        .map_err(|_| format!("Invalid time (expected YYYY-MM-DDTHH:MM): {}", s))
}

fn parse_weekday(s: &str) -> std::result::Result<Weekday, String> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("Unknown weekday: {}", s))
}

fn parse_window(s: &str) -> std::result::Result<u32, String> {
    s.trim()
        .parse::<u32>()
        .ok()
        .filter(|days| stats::WINDOW_CHOICES.contains(days))
        .ok_or_else(|| format!("Window must be 7 or 30 days, got {}", s))
}

// ============================================================================
// Mutating commands
// ============================================================================

fn cmd_plan(
    ctx: &Context,
    month: Option<YearMonth>,
    protocol: Option<Protocol>,
    frequency: Option<Frequency>,
    days: Option<Vec<Weekday>>,
    time: Option<StartTime>,
    chronotype: Option<Chronotype>,
) -> Result<()> {
    let today = ctx.clock.now().date();
    let month = month.unwrap_or_else(|| YearMonth::containing(today));

    let mut settings = ctx.config.planner.clone();
    if let Some(protocol) = protocol {
        settings.protocol = protocol;
    }
    if let Some(frequency) = frequency {
        settings.frequency = frequency;
    }
    if let Some(days) = days {
        settings.days = days;
    }
    if let Some(time) = time {
        settings.time = time;
    }
    if let Some(chronotype) = chronotype {
        settings.time = StartTime::new(recommended_start_hour(settings.protocol, chronotype), 0)?;
    }
    settings.validate()?;

    let partial = expand(&settings, month, today);
    let covered = partial.len();
    let fasting = partial.values().filter(|e| e.is_fasting()).count();

    Plan::update(&ctx.plan_path, |plan| {
        plan.apply_bulk(partial);
        Ok(())
    })?;

    if covered == 0 {
        println!("{} is entirely in the past - nothing planned.", month);
        return Ok(());
    }

    println!(
        "✓ Planned {}: {} fasting days out of {} ({} {} at {})",
        month, fasting, covered, settings.protocol, settings.frequency, settings.time
    );
    Ok(())
}

fn cmd_set(
    ctx: &Context,
    day: NaiveDate,
    protocol: Option<Protocol>,
    time: Option<StartTime>,
) -> Result<()> {
    let protocol = protocol.unwrap_or(ctx.config.planner.protocol);
    let time = time.unwrap_or(ctx.config.planner.time);

    let (plan, _) = Plan::update(&ctx.plan_path, |plan| {
        plan.set_day(day, protocol, time);
        Ok(())
    })?;

    if let Some(r) = plan.fast_on(day) {
        println!(
            "✓ {} fast on {} from {} to {}",
            protocol,
            day,
            r.fast.start_time().format("%H:%M"),
            r.fast.end_time().format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn cmd_clear(ctx: &Context, day: NaiveDate) -> Result<()> {
    Plan::update(&ctx.plan_path, |plan| {
        plan.clear_day(day);
        Ok(())
    })?;
    println!("✓ {} marked as not fasting", day);
    Ok(())
}

fn cmd_complete(
    ctx: &Context,
    day: NaiveDate,
    difficulty: u8,
    feeling: String,
    note: Option<String>,
) -> Result<()> {
    let record = FeelingRecord::new(difficulty, feeling)?;
    let (_, completed) = Plan::update(&ctx.plan_path, |plan| {
        Ok(plan.attach_feeling(day, record, note))
    })?;

    if completed {
        println!("✓ Fast on {} completed", day);
    } else {
        println!("No fast planned on {} - nothing to complete.", day);
    }
    Ok(())
}

fn cmd_uncomplete(ctx: &Context, day: NaiveDate) -> Result<()> {
    let (_, changed) = Plan::update(&ctx.plan_path, |plan| Ok(plan.toggle_uncomplete(day)))?;

    if changed {
        println!("✓ Fast on {} marked as not completed", day);
    } else {
        println!("No completed fast on {} - nothing changed.", day);
    }
    Ok(())
}

fn cmd_reset(ctx: &Context, yes: bool) -> Result<()> {
    if !yes {
        return Err(Error::Other(
            "Refusing to delete the plan without --yes".into(),
        ));
    }
    Plan::update(&ctx.plan_path, |plan| {
        plan.reset();
        Ok(())
    })?;
    println!("✓ Plan deleted");
    Ok(())
}

// ============================================================================
// Read-only views
// ============================================================================

fn cmd_status(ctx: &Context, watch: bool, ticks: Option<u32>) -> Result<()> {
    if !watch {
        let plan = Plan::load(&ctx.plan_path)?;
        print_status(&plan, ctx.clock.now());
        return Ok(());
    }

    let started = Instant::now();
    let mut shown = 0;
    loop {
        // Reload each tick so edits made elsewhere show up
        let plan = Plan::load(&ctx.plan_path)?;
        tracing::debug!("Watch tick {} ({} entries)", shown + 1, plan.len());
        print!("\x1b[2J\x1b[H");
        print_status(&plan, ctx.clock.after(started.elapsed()));
        io::stdout().flush()?;

        shown += 1;
        if ticks.is_some_and(|limit| shown >= limit) {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_secs(1));
    }
}

fn print_status(plan: &Plan, now: NaiveDateTime) {
    match resolve(plan, now) {
        TemporalStatus::Active(r) => {
            let p = progress(r.fast, now);
            println!(
                "Fasting: {} since {} (ends {})",
                r.fast.fasting_length(),
                r.fast.start_time().format("%Y-%m-%d %H:%M"),
                r.fast.end_time().format("%Y-%m-%d %H:%M")
            );
            println!(
                "  Elapsed {}  Remaining {}  {:.0}%",
                format_hms(p.elapsed),
                format_hms(p.remaining),
                p.percent
            );
            if let Some(stage) = p.stage {
                println!("  Stage: {} ({})", stage.name, stage.tip);
            }
            println!("  Goal: {}", r.fast.goal());
        }
        TemporalStatus::Next(r) => {
            let c = countdown(r.fast, now);
            println!(
                "Next fast: {} on {} at {}",
                r.fast.fasting_length(),
                r.day,
                r.fast.start_time().format("%H:%M")
            );
            println!(
                "  Starts in {}d {:02}h {:02}m {:02}s",
                c.days, c.hours, c.minutes, c.seconds
            );
        }
        TemporalStatus::Idle => {
            println!("No fast running and none planned.");
        }
    }
}

fn cmd_calendar(ctx: &Context, month: Option<YearMonth>, filters: Filters) -> Result<()> {
    let plan = Plan::load(&ctx.plan_path)?;
    let now = ctx.clock.now();
    let month = month.unwrap_or_else(|| YearMonth::containing(now.date()));
    let active = resolve(&plan, now).active();

    println!("{}", month);
    println!(
        "{}",
        WEEKDAY_LABELS
            .iter()
            .map(|label| format!("{:<7}", label))
            .collect::<String>()
            .trim_end()
    );

    for week in calendar_grid(month).chunks(7) {
        let row: String = week
            .iter()
            .map(|day| {
                let cell = resolve_day(&plan, *day);
                render_cell(&cell, month.contains(*day), active, &filters)
            })
            .collect();
        println!("{}", row.trim_end());
    }

    let summary = summarize_view(&calendar_view(&plan, month, &filters));
    println!();
    println!(
        "Planned: {}  Completed: {}  Success: {}%",
        summary.planned, summary.completed, summary.success_rate
    );
    if !filters.is_default() {
        println!("(Cells outside the filter are shown as ·)");
    }
    Ok(())
}

/// Seven-column cell: day number, active marker, role marker, logged mood
fn render_cell(cell: &DayCell<'_>, in_month: bool, active: Option<FastRef<'_>>, filters: &Filters) -> String {
    if !in_month {
        return format!("{:<7}", " .");
    }

    let active_mark = if active.is_some_and(|a| cell.overlaps_active(a)) {
        '*'
    } else {
        ' '
    };

    let marker = match cell.primary() {
        None => String::new(),
        Some(_) if !cell.is_visible(filters) => "·".to_string(),
        Some((role, r)) => {
            let mut done = String::new();
            if cell.is_completed() {
                done.push('✓');
                if let Some(symbol) = cell.feeling().and_then(|f| f.feeling.chars().next()) {
                    done.push(symbol);
                }
            }
            match role {
                CellRole::Starting => format!("{}{}", r.fast.fasting_length().hours(), done),
                CellRole::Progressing => format!("──{}", done),
                CellRole::Ending => format!("◀{}", done),
            }
        }
    };

    format!("{:>2}{}{:<4}", cell.day.day(), active_mark, marker)
}

fn cmd_history(ctx: &Context, filters: Filters) -> Result<()> {
    let plan = Plan::load(&ctx.plan_path)?;
    let entries = history_view(&plan, ctx.clock.now(), &filters);

    if entries.is_empty() {
        println!("No past fasts.");
        return Ok(());
    }

    for r in &entries {
        let mut line = format!(
            "{}  {:>3}  {} -> {}",
            r.day,
            r.fast.fasting_length(),
            r.fast.start_time().format("%H:%M"),
            r.fast.end_time().format("%Y-%m-%d %H:%M")
        );
        if r.fast.is_completed() {
            line.push_str("  ✓");
        }
        if let Some(feeling) = r.fast.completion().feeling() {
            line.push_str(&format!(
                " {} {}",
                feeling.feeling,
                difficulty_label(feeling.difficulty).unwrap_or("")
            ));
        }
        if let Some(note) = r.fast.completion().note() {
            line.push_str(&format!("  \"{}\"", note));
        }
        println!("{}", line);
    }

    let summary = summarize_view(&entries);
    println!();
    println!(
        "Planned: {}  Completed: {}  Success: {}%",
        summary.planned, summary.completed, summary.success_rate
    );
    Ok(())
}

fn cmd_stats(ctx: &Context, window: Option<u32>, share: bool) -> Result<()> {
    let plan = Plan::load(&ctx.plan_path)?;
    let window = window.unwrap_or(ctx.config.stats.window_days);
    let stats = summarize(plan.fasts().map(|r| r.fast), window, ctx.clock.now());

    if share {
        print!("{}", stats::share_report(&stats, window));
        return Ok(());
    }

    println!("Last {} days", window);
    println!("  Fasts completed: {}", stats.total_fasts);
    println!("  Average length:  {} h", stats.average_duration);
    println!("  Longest fast:    {} h", stats.longest_fast);
    println!("  Longest streak:  {}", stats.longest_streak);

    let earned = stats::badges(&stats);
    if !earned.is_empty() {
        println!();
        println!("Badges");
        for badge in earned {
            println!("  {} {}: {}", badge.icon(), badge.name(), badge.description(&stats));
        }
    }

    let tally = stats::feeling_tally(plan.fasts().map(|r| r.fast));
    if !tally.is_empty() {
        println!();
        println!("Feelings");
        for (feeling, count) in tally {
            match FEELINGS.iter().find(|(symbol, _)| *symbol == feeling) {
                Some((_, label)) => println!("  {} {} x{}", feeling, label, count),
                None => println!("  {} x{}", feeling, count),
            }
        }
    }
    Ok(())
}

fn cmd_heatmap(ctx: &Context, year: Option<i32>) -> Result<()> {
    let plan = Plan::load(&ctx.plan_path)?;
    let year = year.unwrap_or_else(|| ctx.clock.now().year());

    println!("{}  (· none, 0-5 shorter to longer, + completed)", year);
    for row in yearly_heatmap(&plan, year) {
        let mut line = format!("{:02} ", row.month.month());
        line.push_str(&" ".repeat(row.leading_blanks as usize));
        for (_, cell) in &row.days {
            match cell {
                HeatCell::Empty => line.push('·'),
                HeatCell::Fast { shade, completed } => {
                    line.push(char::from(b'0' + shade));
                    if *completed {
                        line.push('+');
                    }
                }
            }
        }
        println!("{}", line.trim_end());
    }
    Ok(())
}

fn cmd_export(ctx: &Context, month: Option<YearMonth>, output: Option<PathBuf>) -> Result<()> {
    let plan = Plan::load(&ctx.plan_path)?;
    let now = ctx.clock.now();
    let month = month.unwrap_or_else(|| YearMonth::containing(now.date()));

    let records = match export::export_month(&plan, month, now) {
        Ok(records) => records,
        Err(Error::NothingToExport) => {
            tracing::debug!("No fasts in {}, skipping ICS export", month);
            println!("No fasts planned in {} - nothing to export.", month);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let path = output.unwrap_or_else(|| ctx.data_dir.join(export::ics_file_name(month)));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, export::to_ics(&records))?;

    println!("✓ Exported {} fasts to {}", records.len(), path.display());
    Ok(())
}

fn cmd_export_csv(ctx: &Context, output: Option<PathBuf>, filters: Filters) -> Result<()> {
    let plan = Plan::load(&ctx.plan_path)?;
    let path = output.unwrap_or_else(|| ctx.data_dir.join("history.csv"));

    let selected = plan.fasts().filter(|r| matches_fast(r.fast, &filters));
    match export::write_history_csv(&path, selected) {
        Ok(count) => {
            println!("✓ Exported {} fasts to {}", count, path.display());
            Ok(())
        }
        Err(Error::NothingToExport) => {
            tracing::debug!("Filters {:?} matched no fasts, skipping CSV export", filters);
            println!("No fasts match - nothing to export.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn cmd_recommend(ctx: &Context, protocol: Option<Protocol>, chronotype: Chronotype) -> Result<()> {
    let protocol = protocol.unwrap_or(ctx.config.planner.protocol);
    let hour = recommended_start_hour(protocol, chronotype);
    println!(
        "Suggested start for a {} fast ({} chronotype): {:02}:00",
        protocol, chronotype, hour
    );
    println!("  Goal: {}", goal_for(protocol));
    Ok(())
}
