use exam_session_client::models::session::{Command, SessionSnapshot};

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    Quit,
    Ignore,
}

/// Parses one console line against the question currently shown.
/// Question and option numbers are 1-based.
pub fn parse_line(line: &str, snapshot: &SessionSnapshot) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Input::Ignore);
    };
    let argument = words.next();

    let command = match verb.to_ascii_lowercase().as_str() {
        "n" | "next" => Command::Next,
        "p" | "prev" | "previous" => Command::Previous,
        "g" | "goto" => Command::GoTo(position(argument)? - 1),
        "a" | "answer" => {
            let question = snapshot
                .current_question
                .as_ref()
                .ok_or_else(|| "no question is displayed".to_owned())?;
            let choice = position(argument)?;
            let value = question
                .options
                .get(choice - 1)
                .ok_or_else(|| format!("option {} does not exist", choice))?;
            Command::Answer {
                question_id: question.id.clone(),
                value: value.clone(),
            }
        }
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "submit" => Command::ConfirmSubmit,
        "retry" => Command::Retry,
        "q" | "quit" => return Ok(Input::Quit),
        other => return Err(format!("unknown command '{}'", other)),
    };
    Ok(Input::Command(command))
}

/// Parses an exam-list choice into a 0-based index; `None` means quit.
pub fn parse_choice(line: &str, count: usize) -> Result<Option<usize>, String> {
    let line = line.trim();
    if matches!(line.to_ascii_lowercase().as_str(), "q" | "quit") {
        return Ok(None);
    }
    let choice = position(Some(line).filter(|line| !line.is_empty()))?;
    if choice > count {
        return Err(format!("exam {} does not exist", choice));
    }
    Ok(Some(choice - 1))
}

fn position(argument: Option<&str>) -> Result<usize, String> {
    let raw = argument.ok_or_else(|| "a number is required".to_owned())?;
    match raw.parse::<usize>() {
        Ok(value) if value >= 1 => Ok(value),
        _ => Err(format!("'{}' is not a number from 1", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_session_client::models::exam::Question;

    fn showing_question() -> SessionSnapshot {
        let mut snapshot = SessionSnapshot::loading("e1");
        snapshot.question_count = 2;
        snapshot.current_question = Some(Question {
            id: "q1".to_owned(),
            text: "2+2?".to_owned(),
            options: vec!["3".to_owned(), "4".to_owned()],
            points: None,
        });
        snapshot
    }

    #[test]
    fn navigation_words() {
        let snapshot = showing_question();
        assert_eq!(parse_line("n", &snapshot), Ok(Input::Command(Command::Next)));
        assert_eq!(parse_line("prev", &snapshot), Ok(Input::Command(Command::Previous)));
        assert_eq!(parse_line("g 2", &snapshot), Ok(Input::Command(Command::GoTo(1))));
        assert_eq!(parse_line("  ", &snapshot), Ok(Input::Ignore));
        assert_eq!(parse_line("quit", &snapshot), Ok(Input::Quit));
    }

    #[test]
    fn answer_picks_the_option_text() {
        let snapshot = showing_question();
        assert_eq!(
            parse_line("a 2", &snapshot),
            Ok(Input::Command(Command::Answer {
                question_id: "q1".to_owned(),
                value: "4".to_owned()
            }))
        );
        assert!(parse_line("a 3", &snapshot).is_err());
        assert!(parse_line("a 0", &snapshot).is_err());
        assert!(parse_line("a", &snapshot).is_err());
    }

    #[test]
    fn answer_needs_a_displayed_question() {
        let snapshot = SessionSnapshot::loading("e1");
        assert!(parse_line("a 1", &snapshot).is_err());
        assert!(parse_line("dance", &snapshot).is_err());
    }

    #[test]
    fn exam_choice_is_one_based_and_bounded() {
        assert_eq!(parse_choice(" 2 ", 3), Ok(Some(1)));
        assert_eq!(parse_choice("q", 3), Ok(None));
        assert!(parse_choice("4", 3).is_err());
        assert!(parse_choice("0", 3).is_err());
        assert!(parse_choice("", 3).is_err());
    }
}
