mod cli;
mod commands;
mod render;

use std::path::Path;
use std::process::ExitCode;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use classroom_config::ClassroomConfig;
use classroom_sync::{AudioBackend, RoomController, RoomHandle};

use commands::Input;

fn audio_backend() -> Box<dyn AudioBackend> {
    #[cfg(feature = "device-audio")]
    {
        Box::new(classroom_sync::CpalBackend::new())
    }
    #[cfg(not(feature = "device-audio"))]
    {
        Box::new(classroom_sync::NullBackend)
    }
}

fn init_logging(args: &cli::Args, config: &ClassroomConfig) {
    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.as_directive().to_string());
    let fallback = format!("classroom_sync={level},classroom_cli={level}");

    // Logs go to stderr so stdout stays the room transcript.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();
}

async fn ask_username(lines: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    println!("username:");
    loop {
        let line = lines.next_line().await.ok()??;
        let name = line.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
}

/// Apply one input. Returns `false` when the user asked to quit.
async fn dispatch(handle: &RoomHandle, input: Input) -> bool {
    match input {
        Input::Walk(direction, held) => {
            handle.key_down(direction);
            tokio::time::sleep(held).await;
            handle.key_up(direction);
        }
        Input::Say(text) => {
            handle.send_chat(text);
        }
        Input::Board(path) => {
            if let Err(e) = handle.share_whiteboard_file(&path).await {
                eprintln!("! could not share {}: {e}", path.display());
            }
        }
        Input::Mic(true) => {
            handle.start_voice();
        }
        Input::Mic(false) => {
            handle.stop_voice();
        }
        Input::Mute(muted) => {
            handle.set_muted(muted);
        }
        Input::Who => match handle.snapshot().await {
            Some(participants) if participants.is_empty() => println!("  (nobody else)"),
            Some(participants) => {
                for p in &participants {
                    println!("{}", render::describe_participant(p));
                }
            }
            None => eprintln!("! room is not running"),
        },
        Input::Join => {
            handle.connect();
        }
        Input::Leave => {
            handle.leave();
        }
        Input::Help => println!("{}", commands::HELP),
        Input::Quit => return false,
    }
    true
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let loaded = match &args.config {
        Some(path) => classroom_config::load_config_from(Path::new(path)),
        None => classroom_config::load_config(),
    };
    let (mut config, config_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (ClassroomConfig::default(), Some(e)),
    };

    init_logging(&args, &config);
    if let Some(e) = config_error {
        tracing::warn!("config error, using defaults: {e}");
    }

    if let Some(server) = &args.server {
        config.server.backend_url = server.clone();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let username = match args
        .username
        .clone()
        .or_else(|| Some(config.identity.username.clone()).filter(|n| !n.trim().is_empty()))
    {
        Some(name) => name,
        None => match ask_username(&mut lines).await {
            Some(name) => name,
            None => return ExitCode::FAILURE,
        },
    };

    let (controller, handle, mut updates) =
        match RoomController::new(&config, username.clone(), audio_backend()) {
            Ok(parts) => parts,
            Err(e) => {
                eprintln!("classroom: {e}");
                return ExitCode::FAILURE;
            }
        };

    tracing::info!(
        username = %username,
        server = %config.server.backend_url,
        "Starting classroom client"
    );

    let room = tokio::spawn(controller.run());
    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            println!("{}", render::describe(&update));
        }
    });

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("stdin error: {e}");
                break;
            }
        };
        match commands::parse_line(&line) {
            Ok(Some(input)) => {
                if !dispatch(&handle, input).await {
                    break;
                }
            }
            Ok(None) => {}
            Err(message) => eprintln!("! {message}"),
        }
    }

    // Dropping the last handle makes the controller leave and stop.
    drop(handle);
    if let Err(e) = room.await {
        tracing::warn!("room task failed: {e}");
    }
    let _ = printer.await;
    ExitCode::SUCCESS
}
