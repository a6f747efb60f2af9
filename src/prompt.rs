use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// The interactive side of quality selection: show lines, read one answer.
///
/// `read_line` returns `Ok(None)` at end of input.
pub trait Prompt {
    fn show(&mut self, line: &str);

    fn read_line(&mut self, question: &str) -> io::Result<Option<String>>;
}

/// Terminal prompt over stdout/stdin.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn show(&mut self, line: &str) {
        println!("{}", line);
    }

    fn read_line(&mut self, question: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", question)?;
        stdout.flush()?;

        let mut answer = String::new();
        let read = io::stdin().lock().read_line(&mut answer)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(answer.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Prompt fed from a fixed list of answers; records everything shown.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub shown: Vec<String>,
    pub questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            shown: Vec::new(),
            questions: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompt for ScriptedPrompt {
    fn show(&mut self, line: &str) {
        self.shown.push(line.to_string());
    }

    fn read_line(&mut self, question: &str) -> io::Result<Option<String>> {
        self.questions.push(question.to_string());
        Ok(self.answers.pop_front())
    }
}
