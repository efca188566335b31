use clap::Parser;
use itertools::Itertools;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::Level;
use youshiki::ast::DisplayExpression;
use youshiki::data::StepOutcome;
use youshiki::prelude::*;

/// Drive a schema-driven multi-stage form from the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the form configuration JSON file
    form_path: Option<String>,
    /// Optional path to a session script to replay
    script_path: Option<String>,

    /// Read the configuration in the legacy attribute-based format
    #[arg(long)]
    legacy: bool,

    /// Fill in the form interactively
    #[arg(short, long)]
    interactive: bool,

    /// Log transitions, rejected edits and failing predicates
    #[arg(short, long)]
    verbose: bool,

    /// Print the compiled expression tree of every computed field
    #[arg(long)]
    explain: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();

    let form_path = match cli.form_path.clone() {
        Some(path) => path,
        None if cli.interactive => {
            prompt_for_input("Enter form configuration path", Some("data/form.json"))
        }
        None => exit_with_error("Form path is required in non-interactive mode."),
    };

    let total_start = Instant::now();

    // --- 1. Loading ---
    let load_start = Instant::now();
    let form = load_form(&form_path, cli.legacy);
    let load_duration = load_start.elapsed();

    // --- 2. Compilation ---
    let compile_start = Instant::now();
    let engine = Arc::new(FormEngine::new(form));
    let compile_duration = compile_start.elapsed();
    println!(
        "Compiled '{}': {} stage(s), {} computed field(s) in {:?}",
        engine.form().name,
        engine.form().stage_count(),
        engine.calculations().len(),
        compile_duration
    );
    if cli.explain {
        explain(&engine);
    }

    // --- 3. Session ---
    let mut session = FormSession::new(engine);
    let mut context = AppContext::new();
    let session_start = Instant::now();
    if cli.interactive {
        run_interactive(&mut session, &mut context);
    } else if let Some(script_path) = &cli.script_path {
        run_script(script_path, &mut session, &mut context);
    } else {
        println!("No session script provided. Showing the initial state.");
    }
    let session_duration = session_start.elapsed();

    // --- 4. Results and Summary ---
    print_summary(&session, &context);

    println!("\n--- Performance Summary ---");
    println!("File Loading:         {:?}", load_duration);
    println!("Compilation:          {:?}", compile_duration);
    println!("Session:              {:?}", session_duration);
    println!("-----------------------------");
    println!("Total Execution:      {:?}", total_start.elapsed());
    println!();
}

fn load_form(path: &str, legacy: bool) -> Form {
    let json = fs::read_to_string(path)
        .unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to read form file '{}': {}", path, e))
        });

    let loaded = if legacy {
        LegacyForm::from_json(&json).and_then(IntoForm::into_form)
    } else {
        Form::from_json(&json)
    };
    loaded.unwrap_or_else(|e| exit_with_error(&format!("Failed to load form: {}", e)))
}

fn explain(engine: &FormEngine) {
    println!("\n--- Computed Fields ---");
    for calculation in engine.calculations() {
        println!("{} = {}", calculation.path, calculation.expression.source);
        match &calculation.expression.program {
            Ok(program) => print!("{}", DisplayExpression { expr: program }),
            Err(e) => println!("  (not compiled: {})", e),
        }
    }
}

fn run_script(path: &str, session: &mut FormSession, context: &mut AppContext) {
    let script = SessionScript::from_file(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load session script: {}", e)));

    println!("\nReplaying {} step(s) from '{}'...", script.steps.len(), path);
    for (index, outcome) in script.replay(session, context).into_iter().enumerate() {
        println!("  {:>3}. {}", index + 1, describe_outcome(&outcome));
    }
}

fn describe_outcome(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Changed { path, accepted: true } => format!("set {}", path),
        StepOutcome::Changed { path, accepted: false } => format!("refused edit of {}", path),
        StepOutcome::InvalidPath { path, error } => format!("bad path '{}': {}", path, error),
        StepOutcome::Navigated(transition) => describe_transition(transition),
    }
}

fn describe_transition(transition: &Transition) -> String {
    match transition {
        Transition::Advanced { from, to } => {
            format!("advanced from stage {} to {}", from + 1, to + 1)
        }
        Transition::Submitted => "submitted".to_string(),
        Transition::Blocked(errors) => format!("blocked by {} error(s)", errors.len()),
        Transition::Moved { from, to } => format!("moved from stage {} to {}", from + 1, to + 1),
        Transition::Ignored => "ignored".to_string(),
    }
}

/// Runs the CLI in an interactive, human-friendly mode with prompts.
fn run_interactive(session: &mut FormSession, context: &mut AppContext) {
    println!("--- Youshiki Interactive Mode ---");

    // The hosting shell routes into the form only once contact details exist.
    while !context.has_contact_info() {
        let email = prompt_for_input("Contact email", None);
        if !email.is_empty() {
            context.dispatch(Action::SetContactInfo(serde_json::json!({ "email": email })));
        }
    }

    let mut renderer = PlainTextRenderer;
    loop {
        println!();
        print!("{}", renderer.render(&session.view()));
        let command =
            prompt_for_input("set <path> <value> | next | back | jump <n> | quit", Some("next"));
        let mut words = command.splitn(3, ' ');

        match (words.next(), words.next(), words.next()) {
            (Some("set"), Some(path), value) => {
                match session.change(path, value.unwrap_or("")) {
                    Ok(true) => {}
                    Ok(false) => println!("'{}' cannot be edited.", path),
                    Err(e) => println!("{}", e),
                }
            }
            (Some("next"), None, None) => {
                let transition = session.submit_into(context);
                println!("-> {}", describe_transition(&transition));
                if transition == Transition::Submitted {
                    break;
                }
            }
            (Some("back"), None, None) => {
                println!("-> {}", describe_transition(&session.previous()));
            }
            (Some("jump"), Some(stage), None) => match stage.parse::<usize>() {
                Ok(stage) if stage > 0 => {
                    println!("-> {}", describe_transition(&session.jump_to(stage - 1)));
                }
                _ => println!("Stages are numbered from 1."),
            },
            (Some("quit"), None, None) => break,
            _ => println!("Unrecognised command."),
        }
    }
}

fn print_summary(session: &FormSession, context: &AppContext) {
    println!("\n--- Values ---");
    let values = serde_json::to_string_pretty(&session.values().to_json())
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize values: {}", e)));
    println!("{}", values);

    let errors = session.visible_errors();
    if !errors.is_empty() {
        println!("\n--- Errors ---");
        for (path, message) in errors.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            println!("  {}: {}", path, message);
        }
    }

    println!("\n--- Progress ---");
    for step in session.view().progress {
        println!("  {}. {} ({:?})", step.index + 1, step.title, step.state);
    }

    match &context.state().quote_form {
        Some(_) => println!("\nForm submitted to the application state."),
        None => println!("\nForm not submitted."),
    }
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout()
        .flush()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to flush stdout: {}", e)));

    match io::stdin().read_line(&mut line) {
        Ok(0) => exit_with_error("Input closed."),
        Ok(_) => {}
        Err(e) => exit_with_error(&format!("Failed to read line: {}", e)),
    }
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
