//! Line-based front-end for the slash commands. Each typed line such as
//! `/buka` or `/tanya kapan niat puasa?` is answered on the output.

use std::io::BufRead;

use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    commands::{Command, CommandHandler, Reply},
};

const UNKNOWN_COMMAND: &str =
    "Perintah tidak dikenal. Gunakan jadwal-sholat [YYYY-MM-DD], buka, imsak, kultum, atau tanya <pertanyaan>.";

/// Blocking reader for a dedicated thread; stops at end of input or when the
/// receiving side is gone.
pub fn forward_stdin(lines: mpsc::Sender<String>) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if lines.blocking_send(line).is_err() {
            break;
        }
    }
}

/// Answers commands until the input ends or `shutdown` is cancelled.
pub async fn run_console<W>(
    handler: &CommandHandler,
    clock: &dyn Clock,
    mut lines: mpsc::Receiver<String>,
    mut output: W,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            log::info!("[COMMAND] Console input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let text = match Command::parse_line(&line) {
            Some(command) => {
                log::info!("[COMMAND] /{} from console", command.name());
                render_reply(&handler.handle(&command, clock.now()).await)
            }
            None => format!("{UNKNOWN_COMMAND}\n"),
        };

        output.write_all(text.as_bytes()).await?;
        output.flush().await?;
    }

    Ok(())
}

pub fn render_reply(reply: &Reply) -> String {
    let mut text = String::new();
    if let Some(content) = &reply.content {
        text.push_str(content);
        text.push('\n');
    }

    for embed in &reply.embeds {
        text.push_str(&format!("== {} ==\n{}\n", embed.title, embed.description));
        for field in &embed.fields {
            text.push_str(&format!("{}: {}\n", field.name, field.value));
        }
        if let Some(footer) = &embed.footer {
            text.push_str(&format!("-- {}\n", footer.text));
        }
    }

    text
}
