mod input;

use anyhow::Result;
use exam_session_client::api::exam::list_exams;
use exam_session_client::api::state::get_remaining_times;
use exam_session_client::api::ApiClient;
use exam_session_client::models::events::SessionEvent;
use exam_session_client::models::exam::ExamInfo;
use exam_session_client::models::session::{format_time, Phase, SessionSnapshot, TimeUrgency};
use exam_session_client::SessionHandle;
use log::debug;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use self::input::{parse_choice, parse_line, Input};

const HELP: &str = "commands: n/next, p/prev, g <k>, a <k>, pause, resume, submit, retry, q/quit";
const FALLBACK_TITLE: &str = "Exam";

pub type StdinLines = Lines<BufReader<Stdin>>;

pub fn stdin_lines() -> StdinLines {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Lists the student's exams and reads a choice. `None` when there is
/// nothing to pick or the student quits.
pub async fn pick_exam(api: &ApiClient, lines: &mut StdinLines) -> Result<Option<String>> {
    let exams = list_exams(api).await?;
    if exams.is_empty() {
        println!("No exams are available right now.");
        return Ok(None);
    }
    let ids: Vec<&str> = exams.iter().map(|exam| exam.exam_id.as_str()).collect();
    let remaining = get_remaining_times(api, &ids).await;

    println!("Available exams:");
    for (index, (exam, left)) in exams.iter().zip(&remaining).enumerate() {
        println!("{}", exam_line(index, exam, *left));
    }
    println!("Pick an exam by number, or q to quit.");

    while let Some(line) = lines.next_line().await? {
        match parse_choice(&line, exams.len()) {
            Ok(Some(index)) => return Ok(Some(exams[index].exam_id.clone())),
            Ok(None) => return Ok(None),
            Err(message) => println!("! {}", message),
        }
    }
    Ok(None)
}

fn exam_line(index: usize, exam: &ExamInfo, remaining: Option<u64>) -> String {
    let mut line = format!(
        "{:>3}. {} - {} min",
        index + 1,
        display_title(&exam.title),
        exam.duration
    );
    match (exam.passing_marks, exam.total_marks) {
        (Some(passing), Some(total)) => line.push_str(&format!(", pass {}/{} marks", passing, total)),
        (None, Some(total)) => line.push_str(&format!(", {} marks", total)),
        (Some(passing), None) => line.push_str(&format!(", pass {} marks", passing)),
        (None, None) => {}
    }
    if let Some(left) = remaining.filter(|left| *left > 0) {
        line.push_str(&format!(" [continue, {} left]", format_time(left)));
    }
    line
}

fn display_title(title: &str) -> &str {
    if title.trim().is_empty() {
        FALLBACK_TITLE
    } else {
        title
    }
}

/// Drives the session from stdin until it ends or the student quits.
/// Returns the last phase seen.
pub async fn run(mut handle: SessionHandle, lines: &mut StdinLines) -> Result<Phase> {
    let mut state = handle.state();
    let mut view = ViewKey::default();
    println!("{}", HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    let phase = handle.snapshot().phase;
                    handle.close().await;
                    return Ok(phase);
                };
                let snapshot = state.borrow().clone();
                match parse_line(&line, &snapshot) {
                    Ok(Input::Command(command)) => {
                        if !handle.send(command) {
                            return Ok(snapshot.phase);
                        }
                    }
                    Ok(Input::Quit) => {
                        handle.close().await;
                        return Ok(snapshot.phase);
                    }
                    Ok(Input::Ignore) => {}
                    Err(message) => println!("! {}\n{}", message, HELP),
                }
            }
            event = handle.next_event() => match event {
                Some(event) => print_event(&event),
                None => return Ok(handle.snapshot().phase),
            },
            changed = state.changed() => {
                if changed.is_err() {
                    debug!("Session state closed");
                    while let Some(event) = handle.next_event().await {
                        print_event(&event);
                    }
                    return Ok(handle.snapshot().phase);
                }
                let snapshot = state.borrow_and_update().clone();
                render(&snapshot, &mut view);
            }
        }
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::PhaseChanged { to, .. } => match to {
            Phase::Loading => println!("Loading exam..."),
            Phase::InProgress => println!("Exam started."),
            Phase::Expired => {}
            Phase::Submitting => println!("Submitting answers..."),
            Phase::Submitted => println!("Answers submitted."),
            Phase::Failed => println!("Something went wrong. Type 'retry' to try again."),
        },
        SessionEvent::Expired => println!("Time is up! Your answers are being submitted."),
        SessionEvent::CommandRejected(reason) => println!("! {}", reason),
        SessionEvent::Notice(message) => println!("* {}", message),
    }
}

/// The parts of a snapshot that warrant reprinting the question.
#[derive(Default, PartialEq)]
struct ViewKey {
    phase: Option<Phase>,
    index: usize,
    answer: Option<String>,
    paused: bool,
}

fn render(snapshot: &SessionSnapshot, view: &mut ViewKey) {
    let key = ViewKey {
        phase: Some(snapshot.phase),
        index: snapshot.current_index,
        answer: snapshot.current_answer.clone(),
        paused: snapshot.paused,
    };
    if key != *view {
        *view = key;
        render_question(snapshot);
    } else if snapshot.phase == Phase::InProgress && should_print_time(snapshot.remaining_seconds) {
        println!("{}", time_line(snapshot));
    }
}

fn should_print_time(remaining: u64) -> bool {
    remaining <= 10 || remaining % 60 == 0
}

fn time_line(snapshot: &SessionSnapshot) -> String {
    let marker = match TimeUrgency::for_remaining(snapshot.remaining_seconds) {
        TimeUrgency::Calm => "",
        TimeUrgency::Warning => " (hurry)",
        TimeUrgency::Critical => " (!!)",
    };
    format!(
        "Time left {}{}{}",
        format_time(snapshot.remaining_seconds),
        marker,
        if snapshot.paused { " [paused]" } else { "" }
    )
}

fn render_question(snapshot: &SessionSnapshot) {
    if snapshot.phase != Phase::InProgress {
        return;
    }
    println!();
    println!("== {} ==", display_title(&snapshot.title));
    println!(
        "{} | progress {}/{} answered, {} unanswered",
        time_line(snapshot),
        snapshot.answered_count(),
        snapshot.question_count,
        snapshot.unanswered_count()
    );
    match &snapshot.current_question {
        Some(question) => {
            let points = match question.points {
                Some(1) => " (1 point)".to_owned(),
                Some(points) => format!(" ({} points)", points),
                None => String::new(),
            };
            println!(
                "Question {}/{}{}: {}",
                snapshot.current_index + 1,
                snapshot.question_count,
                points,
                question.text
            );
            for (index, option) in question.options.iter().enumerate() {
                let selected = snapshot.current_answer.as_deref() == Some(option.as_str());
                println!("  {} {}. {}", if selected { "(x)" } else { "( )" }, index + 1, option);
            }
        }
        None => println!("This exam has no questions."),
    }
}
