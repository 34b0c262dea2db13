use chrono::{Local, TimeZone};
use duotalk::speech::{plan_utterance, Lang};
use duotalk::synth::keyring;
use duotalk::transcript::Role;
use duotalk::{AppError, ChatSession, Settings, Synthesizer};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

fn main() {
    duotalk::load_local_env();
    duotalk::init_logging();

    let settings = duotalk::load_settings();
    let synth = match Synthesizer::create(&settings.provider, &settings.endpoint) {
        Ok(synth) => synth,
        Err(err) => {
            report_error(&AppError::from(err));
            std::process::exit(1);
        }
    };

    let api_key = if settings.provider == "offline" {
        String::new()
    } else {
        resolve_or_prompt_key()
    };

    if settings.provider != "offline" {
        // Cheapest call that exercises credential and connection; mirrors
        // a model-list health check before the first real turn.
        if let Err(err) = synth.preflight(&api_key) {
            report_error(&AppError::from(err));
            std::process::exit(1);
        }
        info!("preflight ok (model {})", settings.model);
    }

    println!("duotalk: one question, KR & EN answer candidates");
    println!(
        "provider {} | model {} | format {:?}",
        synth.provider_id(),
        settings.model,
        settings.answer_format
    );
    println!("Commands: /pick <label>  /default  /say <label>  /history  /config  /reset  /quit");
    println!();

    let mut session = ChatSession::new();
    let stdin = io::stdin();
    loop {
        print!("you> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(command, &mut session, &settings) {
                break;
            }
        } else {
            run_turn(&mut session, &synth, &settings, &api_key, line);
        }
    }

    info!("duotalk shutting down");
}

fn run_turn(
    session: &mut ChatSession,
    synth: &Synthesizer,
    settings: &Settings,
    api_key: &str,
    question: &str,
) {
    if let Err(err) = session.record_question(question) {
        println!("{}", err);
        return;
    }

    let options = settings.synth_options();
    let result = if settings.streaming {
        println!("(generating, streaming...)");
        let result = synth.synthesize_streaming(question, &options, api_key, &mut |delta| {
            print!("{}", delta);
            let _ = io::stdout().flush();
        });
        println!();
        result
    } else {
        println!("(generating...)");
        synth.synthesize(question, &options, api_key)
    };

    match result {
        Ok(set) => {
            println!();
            for (label, text) in set.iter() {
                if text.is_empty() {
                    println!("[{}] (no answer generated)", label);
                } else {
                    println!("[{}] {}", label, text);
                }
                println!();
            }
            println!("Pick with /pick <label>; asking the next question keeps the default.");
            session.accept_candidates(set);
        }
        Err(err) => {
            session.abort_turn();
            report_error(&AppError::from(err));
        }
    }
}

/// Returns false when the shell should exit.
fn handle_command(command: &str, session: &mut ChatSession, settings: &Settings) -> bool {
    let mut parts = command.splitn(2, ' ');
    let name = parts.next().unwrap_or("");
    let arg = parts.next().unwrap_or("").trim();

    match name {
        "quit" | "exit" => return false,
        "reset" => {
            session.reset();
            println!("Session cleared.");
        }
        "pick" => {
            let label = arg.to_uppercase();
            match session.select(&label) {
                Ok(message) => println!("Committed [{}]: {}", label, message.content),
                Err(err) => println!("{}", err),
            }
        }
        "default" => match session.commit_default() {
            Ok(message) => println!("Committed default: {}", message.content),
            Err(err) => println!("{}", err),
        },
        "say" => say(session, settings, &arg.to_uppercase()),
        "history" => history(session),
        "config" => match serde_json::to_string_pretty(settings) {
            Ok(raw) => println!("{}", raw),
            Err(err) => println!("Failed to render settings: {}", err),
        },
        "help" => {
            println!(
                "Commands: /pick <label>  /default  /say <label>  /history  /config  /reset  /quit"
            );
        }
        other => println!("Unknown command: /{}", other),
    }
    true
}

/// Prints the playout plan the external speech collaborator would consume.
/// Prefers a pending candidate; otherwise falls back to the last assistant
/// message.
fn say(session: &ChatSession, settings: &Settings, label: &str) {
    let plan = if let Some(set) = session.pending() {
        match set.get(label) {
            Some(text) if !text.is_empty() => {
                Some(plan_utterance(text, set.lang_of(label), &settings.speech))
            }
            Some(_) => {
                println!("The {} candidate is empty.", label);
                None
            }
            None => {
                println!("Unknown answer label: {}", label);
                None
            }
        }
    } else if let Some(message) = session
        .transcript()
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
    {
        let lang = message.lang.unwrap_or(Lang::English);
        Some(plan_utterance(&message.content, lang, &settings.speech))
    } else {
        println!("Nothing to play yet.");
        None
    };

    if let Some(plan) = plan {
        match serde_json::to_string(&plan) {
            Ok(raw) => println!("utterance: {}", raw),
            Err(err) => println!("Failed to render utterance: {}", err),
        }
    }
}

fn history(session: &ChatSession) {
    if session.transcript().is_empty() {
        println!("(empty transcript)");
        return;
    }
    for message in session.transcript().messages() {
        let stamp = Local
            .timestamp_millis_opt(message.timestamp_ms as i64)
            .single()
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "--:--:--".to_string());
        let who = match message.role {
            Role::User => "you",
            Role::Assistant => "bot",
        };
        match message.lang {
            Some(lang) => println!("[{}] {} ({}): {}", stamp, who, lang.tag(), message.content),
            None => println!("[{}] {}: {}", stamp, who, message.content),
        }
    }
}

/// Key lookup in priority order: stored secret, environment, interactive
/// prompt. A freshly typed key is stored for the next start.
fn resolve_or_prompt_key() -> String {
    if let Some(key) = keyring::resolve_api_key("openai") {
        return key;
    }

    print!("OpenAI API Key: ");
    let _ = io::stdout().flush();
    let mut typed = String::new();
    let _ = io::stdin().lock().read_line(&mut typed);
    let typed = typed.trim().to_string();

    if typed.is_empty() {
        println!("Please add your OpenAI API key to continue.");
        std::process::exit(1);
    }
    if !keyring::looks_like_api_key(&typed) {
        println!("API keys usually start with `sk-` or `sk-proj-`. Double-check the value.");
    }
    match keyring::store_api_key("openai", &typed) {
        Ok(()) => println!("Key stored for the next start."),
        Err(err) => warn!("Could not persist the API key: {}", err),
    }
    typed
}

fn report_error(error: &AppError) {
    eprintln!("{}: {}", error.title(), error.message());
    if let Some(action) = error.suggested_action() {
        eprintln!("  -> {}", action);
    }
}
