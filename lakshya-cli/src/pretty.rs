use anyhow::Result;
use lakshya::api::careers::{CareerMatch, Demand};
use lakshya::api::roadmap::{CourseStatus, LearningRoadmap};
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

fn color_choice() -> ColorChoice {
    if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

fn demand_color(demand: Demand) -> Color {
    match demand {
        Demand::High => Color::Green,
        Demand::Medium => Color::Yellow,
        Demand::Low => Color::Red,
    }
}

/// Renders a fixed-width bar for a 0-100 value, eg `[#####.....]`.
pub fn progress_bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

pub fn pp_career_matches(matches: &[CareerMatch]) -> Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());

    if matches.is_empty() {
        stdout.set_color(ColorSpec::new().set_dimmed(true).set_italic(true))?;
        writeln!(&mut stdout, "no career matches yet; complete onboarding first")?;
        stdout.reset()?;
        return Ok(());
    }

    for m in matches {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
        write!(&mut stdout, "{:<32.32}", m.role)?;
        stdout.reset()?;
        write!(
            &mut stdout,
            " {} {:>5.1}% ",
            progress_bar(m.match_percentage, 20),
            m.match_percentage
        )?;
        stdout.set_color(ColorSpec::new().set_fg(Some(demand_color(m.demand))))?;
        writeln!(&mut stdout, "{} demand", m.demand)?;
        stdout.reset()?;

        if let Some(salary) = &m.salary_range {
            stdout.set_color(ColorSpec::new().set_dimmed(true))?;
            writeln!(&mut stdout, "  salary: {}", salary)?;
            stdout.reset()?;
        }
        if let Some(skills) = &m.skills {
            stdout.set_color(ColorSpec::new().set_dimmed(true).set_italic(true))?;
            writeln!(&mut stdout, "  skills: {}", skills)?;
            stdout.reset()?;
        }
    }
    Ok(())
}

pub fn pp_roadmap(roadmap: &LearningRoadmap) -> Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());

    let stats = &roadmap.stats;
    stdout.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(
        &mut stdout,
        "overall {} {:.0}%",
        progress_bar(stats.overall_progress, 30),
        stats.overall_progress
    )?;
    stdout.reset()?;
    stdout.set_color(ColorSpec::new().set_dimmed(true))?;
    writeln!(
        &mut stdout,
        "{} completed, {} in progress, {} hours invested\n",
        stats.courses_completed, stats.courses_in_progress, stats.hours_invested
    )?;
    stdout.reset()?;

    for stage in &roadmap.stages {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
        write!(&mut stdout, "{:<40.40}", stage.stage)?;
        stdout.reset()?;
        writeln!(
            &mut stdout,
            " {} {:.0}%",
            progress_bar(stage.progress, 20),
            stage.progress
        )?;
        for course in &stage.courses {
            let color = match course.status {
                CourseStatus::Completed => Color::Green,
                CourseStatus::InProgress => Color::Cyan,
                CourseStatus::NotStarted => Color::White,
                CourseStatus::Locked => Color::Red,
            };
            write!(&mut stdout, "  {:>4} ", course.id)?;
            stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
            write!(&mut stdout, "{:<12}", course.status.to_string())?;
            stdout.reset()?;
            write!(&mut stdout, " {:<40.40}", course.title)?;
            stdout.set_color(ColorSpec::new().set_dimmed(true))?;
            writeln!(&mut stdout, " {} ({} topics)", course.duration, course.topics)?;
            stdout.reset()?;
        }
    }

    if !roadmap.milestones.is_empty() {
        writeln!(&mut stdout)?;
        stdout.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(&mut stdout, "milestones")?;
        stdout.reset()?;
        for milestone in &roadmap.milestones {
            let mark = if milestone.completed { "x" } else { " " };
            write!(&mut stdout, "  [{}] {}", mark, milestone.title)?;
            if let Some(date) = &milestone.target_date {
                stdout.set_color(ColorSpec::new().set_dimmed(true))?;
                write!(&mut stdout, " ({})", date)?;
                stdout.reset()?;
            }
            writeln!(&mut stdout)?;
        }
    }
    Ok(())
}

#[test]
fn test_progress_bar() {
    assert_eq!(progress_bar(0.0, 4), "[....]");
    assert_eq!(progress_bar(50.0, 4), "[##..]");
    assert_eq!(progress_bar(100.0, 4), "[####]");
    assert_eq!(progress_bar(150.0, 4), "[####]");
}
