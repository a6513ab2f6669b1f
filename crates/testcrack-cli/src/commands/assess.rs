//! Interactive assessment: maps terminal input onto session operations and
//! renders the state after each one.

use clap::Subcommand;
use std::io::{BufRead, Write};

use testcrack_core::{
    Advance, AssessmentContent, AssessmentFlow, Clock, ContentGateway,
    ContentQuery, FailureKind, Phase, Preferences, ResultMetrics, RetryTarget, SessionState,
};

use super::{runtime, CmdResult, Context};

#[derive(Subcommand)]
pub enum AssessAction {
    /// Read a passage, answer its questions and get graded
    Take {
        #[arg(long)]
        subject: Option<String>,
        /// Difficulty, e.g. easy / medium / hard
        #[arg(long)]
        level: Option<String>,
        /// Use the built-in sample passage instead of fetching one
        #[arg(long)]
        sample: bool,
        /// Print the final result as JSON on stdout (prompts go to stderr)
        #[arg(long)]
        json: bool,
    },
    /// Fetch and print a passage without starting an attempt
    Content {
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        level: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: AssessAction) -> CmdResult {
    let mut ctx = Context::load()?;
    ctx.session.require_authenticated()?;

    match action {
        AssessAction::Take {
            subject,
            level,
            sample,
            json,
        } => {
            let query = resolve_query(&mut ctx, subject, level)?;
            let mut flow = AssessmentFlow::new(ctx.api()?);
            let mut input = std::io::stdin().lock();
            let mut out: Box<dyn Write> = if json {
                Box::new(std::io::stderr())
            } else {
                Box::new(std::io::stdout())
            };
            let outcome =
                runtime()?.block_on(drive(&mut flow, &query, sample, &mut input, &mut out))?;

            match outcome {
                Outcome::Completed(metrics) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&metrics)?);
                    }
                }
                Outcome::Quit => {
                    eprintln!("assessment abandoned");
                }
                Outcome::Failed(FailureKind::Unauthorized, _) => {
                    return Err(ctx.expire_session());
                }
                Outcome::Failed(_, message) => return Err(message.into()),
            }
        }
        AssessAction::Content {
            subject,
            level,
            json,
        } => {
            let query = resolve_query(&mut ctx, subject, level)?;
            let api = ctx.api()?;
            let content = match runtime()?.block_on(api.fetch_content(&query)) {
                Ok(content) => content,
                Err(e) if e.kind() == FailureKind::Unauthorized => {
                    return Err(ctx.expire_session());
                }
                Err(e) => return Err(e.into()),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&content)?);
            } else {
                let mut out = std::io::stdout();
                print_passage(&mut out, &content)?;
                for (i, q) in content.questions.iter().enumerate() {
                    writeln!(out, "{}. {}", i + 1, q.prompt)?;
                    for (j, option) in q.options.iter().enumerate() {
                        writeln!(out, "   {}) {}", j + 1, option)?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// Flags win over remembered preferences, which win over config. Flags
/// given explicitly are remembered for next time.
fn resolve_query(
    ctx: &mut Context,
    subject: Option<String>,
    level: Option<String>,
) -> Result<ContentQuery, Box<dyn std::error::Error>> {
    let remembered = ctx.session.preferences();
    if subject.is_some() || level.is_some() {
        ctx.session.set_preferences(Preferences {
            subject: subject.clone().or(remembered.subject.clone()),
            level: level.clone().or(remembered.level.clone()),
        })?;
    }
    Ok(ContentQuery::new(
        subject
            .or(remembered.subject)
            .or_else(|| ctx.config.assessment.subject.clone()),
        level
            .or(remembered.level)
            .or_else(|| ctx.config.assessment.level.clone()),
    ))
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// 1-based option number.
    Select(usize),
    Next,
    Previous,
    Retry,
    Back,
    Quit,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim().to_ascii_lowercase();
    match trimmed.as_str() {
        "" | "n" | "next" => Input::Next,
        "p" | "prev" | "previous" => Input::Previous,
        "r" | "retry" => Input::Retry,
        "b" | "back" => Input::Back,
        "q" | "quit" | "exit" => Input::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n > 0 => Input::Select(n),
            _ => Input::Unknown(other.to_string()),
        },
    }
}

#[derive(Debug)]
pub enum Outcome {
    Completed(ResultMetrics),
    Quit,
    Failed(FailureKind, String),
}

/// Run one attempt to completion, reading commands from `input` and
/// rendering to `out`. End of input counts as quitting.
pub async fn drive<G, C, R, W>(
    flow: &mut AssessmentFlow<G, C>,
    query: &ContentQuery,
    sample: bool,
    input: &mut R,
    out: &mut W,
) -> Result<Outcome, Box<dyn std::error::Error>>
where
    G: ContentGateway,
    C: Clock,
    R: BufRead,
    W: Write,
{
    if sample {
        flow.load_local(AssessmentContent::sample());
    } else {
        writeln!(out, "Loading assessment...")?;
        flow.load(query).await;
    }

    let mut shown_attempt = None;
    loop {
        match flow.state().phase {
            Phase::Reading => {
                if shown_attempt != Some(flow.state().attempt_id) {
                    shown_attempt = Some(flow.state().attempt_id);
                    if let Some(content) = &flow.state().content {
                        print_passage(out, content)?;
                    }
                }
                let ticker = flow.controller().reading_ticker().unwrap_or_default();
                writeln!(
                    out,
                    "Reading time: {ticker}. Press Enter when done, t to refresh the time, q to quit."
                )?;
                let Some(line) = read_line(input)? else {
                    return Ok(Outcome::Quit);
                };
                match parse_input(&line) {
                    Input::Next => {
                        flow.advance_to_questions()?;
                    }
                    Input::Quit => return Ok(Outcome::Quit),
                    _ => {}
                }
            }
            Phase::Answering => {
                print_question(out, flow.state())?;
                let Some(line) = read_line(input)? else {
                    return Ok(Outcome::Quit);
                };
                match parse_input(&line) {
                    Input::Select(n) => {
                        let index = flow.state().current_question_index;
                        if flow.select_answer(index, n - 1)?.is_none() {
                            writeln!(out, "There is no option {n}.")?;
                        }
                    }
                    Input::Next => match flow.next_question().await? {
                        Advance::Blocked => writeln!(out, "Select an answer first.")?,
                        Advance::Moved(_) | Advance::Submit(_) | Advance::AlreadySubmitting => {}
                    },
                    Input::Previous => {
                        flow.previous_question()?;
                    }
                    Input::Quit => return Ok(Outcome::Quit),
                    Input::Retry | Input::Back | Input::Unknown(_) => {
                        writeln!(out, "Enter an option number, n for next, p for previous or q to quit.")?;
                    }
                }
            }
            Phase::Done => {
                let Some(metrics) = flow.state().result.clone() else {
                    return Err("graded session has no result".into());
                };
                writeln!(out)?;
                write!(out, "{}", metrics.summary())?;
                return Ok(Outcome::Completed(metrics));
            }
            Phase::Failed => {
                let state = flow.state();
                let message = state
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "assessment failed".to_string());
                let kind = state.last_error_kind.unwrap_or(FailureKind::ContentUnavailable);
                writeln!(out, "Error: {message}")?;
                if kind == FailureKind::Unauthorized {
                    return Ok(Outcome::Failed(kind, message));
                }

                let retry = state.retry;
                match retry {
                    Some(RetryTarget::Submission) => {
                        writeln!(out, "r to retry, b to go back to your answers, q to quit.")?
                    }
                    _ => writeln!(out, "r to retry, q to quit.")?,
                }
                let Some(line) = read_line(input)? else {
                    return Ok(Outcome::Failed(kind, message));
                };
                match (parse_input(&line), retry) {
                    (Input::Retry, Some(RetryTarget::Submission)) => {
                        writeln!(out, "Submitting answers...")?;
                        flow.retry_submission().await?;
                    }
                    (Input::Retry, _) => {
                        if sample {
                            flow.load_local(AssessmentContent::sample());
                        } else {
                            writeln!(out, "Loading assessment...")?;
                            flow.load(query).await;
                        }
                    }
                    (Input::Back, Some(RetryTarget::Submission)) => {
                        flow.resume_answering()?;
                    }
                    (Input::Quit, _) => return Ok(Outcome::Failed(kind, message)),
                    _ => {}
                }
            }
            // `load` and `next_question` resolve their requests before
            // returning, so these are never observed here.
            Phase::Loading | Phase::Submitting => {
                return Err(format!("unexpected session phase {:?}", flow.state().phase).into());
            }
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn print_passage<W: Write>(out: &mut W, content: &AssessmentContent) -> std::io::Result<()> {
    if let Some(title) = &content.title {
        writeln!(out, "== {title} ==")?;
    }
    let mut tags = Vec::new();
    if let Some(subject) = &content.subject {
        tags.push(subject.as_str());
    }
    if let Some(level) = &content.level {
        tags.push(level.as_str());
    }
    if !tags.is_empty() {
        writeln!(out, "[{}]", tags.join(" / "))?;
    }
    writeln!(out)?;
    writeln!(out, "{}", content.passage)?;
    writeln!(
        out,
        "\n({} words, {} questions)",
        content.word_count(),
        content.question_count()
    )
}

fn print_question<W: Write>(out: &mut W, state: &SessionState) -> std::io::Result<()> {
    let Some(question) = state.current_question() else {
        return Ok(());
    };
    let selected = state.current_answer();
    writeln!(out)?;
    writeln!(
        out,
        "Question {} of {} ({} answered, {:.0}%)",
        state.current_question_index + 1,
        state.question_count(),
        state.answered_count(),
        state.progress_pct()
    )?;
    writeln!(out, "{}", question.prompt)?;
    for (i, option) in question.options.iter().enumerate() {
        let marker = if selected == Some(i) { '*' } else { ' ' };
        writeln!(out, " {marker} {}) {option}", i + 1)?;
    }
    let next = if state.is_last_question() { "submit" } else { "next" };
    writeln!(out, "[1-{}] choose, n {next}, p previous, q quit", question.options.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use testcrack_core::{
        GatewayError, ManualClock, SessionController, SubmissionPayload,
    };

    struct StubGateway {
        content: Result<AssessmentContent, GatewayError>,
        grades: Mutex<Vec<Result<ResultMetrics, GatewayError>>>,
        submitted: Mutex<Vec<SubmissionPayload>>,
    }

    impl StubGateway {
        fn new(grades: Vec<Result<ResultMetrics, GatewayError>>) -> Self {
            Self {
                content: Ok(AssessmentContent::sample()),
                grades: Mutex::new(grades),
                submitted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentGateway for StubGateway {
        async fn fetch_content(
            &self,
            _query: &ContentQuery,
        ) -> Result<AssessmentContent, GatewayError> {
            self.content.clone()
        }

        async fn submit_answers(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<ResultMetrics, GatewayError> {
            self.submitted.lock().unwrap().push(payload.clone());
            self.grades.lock().unwrap().remove(0)
        }
    }

    fn metrics() -> ResultMetrics {
        ResultMetrics {
            speed_score: 210.0,
            accuracy: 100.0,
            words_per_minute: 250.0,
            retention_rate: 100.0,
            correct_answers: 2,
            total_questions: 2,
            reading_time: 10,
            question_time: 8,
            total_time: 18,
            user_stats: None,
        }
    }

    fn flow(gateway: StubGateway) -> AssessmentFlow<StubGateway, ManualClock> {
        AssessmentFlow::with_controller(gateway, SessionController::with_clock(ManualClock::new()))
    }

    async fn run_script(
        flow: &mut AssessmentFlow<StubGateway, ManualClock>,
        script: &str,
    ) -> (Outcome, String) {
        let mut input = script.as_bytes();
        let mut out = Vec::new();
        let outcome = drive(flow, &ContentQuery::default(), false, &mut input, &mut out)
            .await
            .unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input("\n"), Input::Next);
        assert_eq!(parse_input(" N "), Input::Next);
        assert_eq!(parse_input("p"), Input::Previous);
        assert_eq!(parse_input("3"), Input::Select(3));
        assert_eq!(parse_input("0"), Input::Unknown("0".into()));
        assert_eq!(parse_input("q"), Input::Quit);
        assert_eq!(parse_input("r"), Input::Retry);
        assert_eq!(parse_input("b"), Input::Back);
        assert_eq!(parse_input("huh"), Input::Unknown("huh".into()));
    }

    #[tokio::test]
    async fn full_attempt_submits_once() {
        let mut flow = flow(StubGateway::new(vec![Ok(metrics())]));
        let (outcome, out) = run_script(&mut flow, "\n1\nn\n2\nn\n").await;

        assert!(matches!(outcome, Outcome::Completed(m) if m == metrics()));
        assert!(out.contains("Advanced Algebra Concepts"));
        assert!(out.contains("Question 2 of 2"));
        let submitted = flow.gateway().submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].answers, vec![Some(0), Some(1)]);
    }

    #[tokio::test]
    async fn unanswered_question_blocks_and_bad_option_is_ignored() {
        let mut flow = flow(StubGateway::new(vec![Ok(metrics())]));
        let (outcome, out) = run_script(&mut flow, "\n1\nn\nn\n9\n2\nn\n").await;

        assert!(out.contains("Select an answer first."));
        assert!(out.contains("There is no option 9."));
        assert!(matches!(outcome, Outcome::Completed(_)));
        assert_eq!(flow.gateway().submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_submission_can_be_retried() {
        let mut flow = flow(StubGateway::new(vec![
            Err(GatewayError::SubmissionRejected("try later".into())),
            Ok(metrics()),
        ]));
        let (outcome, out) = run_script(&mut flow, "\n1\nn\n2\nn\nr\n").await;

        assert!(out.contains("try later"));
        assert!(matches!(outcome, Outcome::Completed(_)));
        let submitted = flow.gateway().submitted.lock().unwrap();
        assert_eq!(submitted.len(), 2);
        assert_eq!(submitted[0], submitted[1]);
    }

    #[tokio::test]
    async fn back_after_failure_keeps_answers() {
        let mut flow = flow(StubGateway::new(vec![
            Err(GatewayError::SubmissionRejected("nope".into())),
            Ok(metrics()),
        ]));
        // Fail, go back, change the last answer, submit again.
        let (outcome, _) = run_script(&mut flow, "\n1\nn\n2\nn\nb\n3\nn\n").await;

        assert!(matches!(outcome, Outcome::Completed(_)));
        let submitted = flow.gateway().submitted.lock().unwrap();
        assert_eq!(submitted[1].answers, vec![Some(0), Some(2)]);
    }

    #[tokio::test]
    async fn unauthorized_stops_without_prompting() {
        let mut flow = flow(StubGateway::new(vec![Err(GatewayError::Unauthorized)]));
        let (outcome, _) = run_script(&mut flow, "\n1\nn\n2\nn\n").await;
        assert!(matches!(outcome, Outcome::Failed(FailureKind::Unauthorized, _)));
    }

    #[tokio::test]
    async fn load_failure_then_quit() {
        let mut gateway = StubGateway::new(Vec::new());
        gateway.content = Err(GatewayError::ContentUnavailable("offline".into()));
        let mut flow = flow(gateway);
        let (outcome, out) = run_script(&mut flow, "q\n").await;

        assert!(out.contains("offline"));
        assert!(matches!(
            outcome,
            Outcome::Failed(FailureKind::ContentUnavailable, m) if m.contains("offline")
        ));
    }

    #[tokio::test]
    async fn reading_prompt_repeats_with_ticker_until_enter() {
        let mut flow = flow(StubGateway::new(Vec::new()));
        let (outcome, out) = run_script(&mut flow, "t\nt\n").await;

        assert!(matches!(outcome, Outcome::Quit));
        assert_eq!(out.matches("Reading time: 0:00.").count(), 3);
        // The passage itself is shown once.
        assert_eq!(out.matches("Advanced Algebra Concepts").count(), 1);
        assert_eq!(flow.state().phase, Phase::Reading);
    }

    #[tokio::test]
    async fn end_of_input_quits() {
        let mut flow = flow(StubGateway::new(Vec::new()));
        let (outcome, _) = run_script(&mut flow, "\n1\n").await;
        assert!(matches!(outcome, Outcome::Quit));
        assert!(flow.gateway().submitted.lock().unwrap().is_empty());
    }
}
