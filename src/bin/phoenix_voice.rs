use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use phoenix_voice::{
    assistant::VoiceAssistant,
    commands::CommandMatcher,
    configuration::{get_configuration, AppConfig},
    debounce::DebounceGate,
    interpreter::VoiceInterpreter,
    logging,
    preferences::VoicePreferences,
    recognizer::LineRecognizer,
    speech::{BackendTtsClient, SpeechService},
};
use std::{io::BufReader, path::PathBuf};
use tokio::{select, sync::mpsc};
use tracing::*;

/// Phoenix voice command interpreter
#[derive(Parser)]
#[command(author, version)]
struct Args {
    /// application configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interpret transcripts read from stdin, one per line.
    /// Matched commands and general input are printed as json
    Listen,
    /// Speak text with the configured voice
    Say { text: String },
    /// List voices offered by the backend
    Voices,
    /// Store voice preferences
    SetVoice {
        voice: String,
        #[arg(long, default_value_t = 1.0)]
        speed: f32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = Args::parse();
    logging::setup_tracing(args.verbose);
    info!("Started phoenix voice");

    let mut app_config = get_configuration(&args.config)?;
    let preferences = load_preferences(&app_config);
    preferences.apply_to(&mut app_config.tts);
    let session = app_config.backend.session();
    debug!("Session {:?}", session);

    match args.command {
        Command::Listen => listen(app_config, &preferences).await?,
        Command::Say { text } => {
            let mut speech_service = SpeechService::new(session, &app_config.tts)?;
            speech_service.probe_backend().await;
            speech_service.say(&text).await?;
        }
        Command::Voices => {
            let voices = BackendTtsClient::new(session)
                .voices()
                .await
                .context("Failed to list backend voices")?;
            for voice in voices {
                match voice.description {
                    Some(description) => println!("{}\t{}", voice.name, description),
                    None => println!("{}", voice.name),
                }
            }
        }
        Command::SetVoice { voice, speed } => {
            let path = app_config
                .preferences_path
                .clone()
                .context("preferences_path is not configured")?;
            let mut preferences = preferences;
            preferences.voice = voice;
            preferences.speed = speed;
            preferences.save(&path)?;
        }
    }
    Ok(())
}

fn load_preferences(app_config: &AppConfig) -> VoicePreferences {
    let defaults = VoicePreferences::from_tts_config(&app_config.tts);
    match &app_config.preferences_path {
        Some(path) => VoicePreferences::load_or(path, defaults),
        None => defaults,
    }
}

async fn listen(app_config: AppConfig, preferences: &VoicePreferences) -> Result<()> {
    let table = app_config.commands.command_table()?;
    info!("Loaded {} voice commands", table.len());
    let matcher = CommandMatcher::new(table, app_config.commands.fuzzy_match);
    let interpreter = VoiceInterpreter::new(
        matcher,
        DebounceGate::new(app_config.commands.debounce_window()),
        app_config.recognition.max_alternatives,
    );

    let mut speech_service = SpeechService::new(app_config.backend.session(), &app_config.tts)?;
    speech_service.probe_backend().await;

    info!(
        "Input sensitivity {} gives gain {:.1}",
        preferences.sensitivity,
        preferences.gain()
    );
    let (recognizer, recognizer_events) = LineRecognizer::spawn(BufReader::new(std::io::stdin()));

    let (event_sender, mut event_receiver) = mpsc::channel(10);
    let printer = tokio::spawn(async move {
        while let Some(event) = event_receiver.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => println!("{}", json),
                Err(err) => error!("Failed to serialize voice event: {}", err),
            }
        }
    });

    let mut assistant = VoiceAssistant::new(
        recognizer,
        speech_service,
        interpreter,
        app_config.listening.clone(),
        event_sender,
    );

    select! {
        _ = assistant.run(recognizer_events) => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c, stopping");
        }
    }

    // closes the event channel
    drop(assistant);
    printer.await?;
    Ok(())
}
