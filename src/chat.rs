// Line-oriented terminal front end for the widget.

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::session::{UiEvent, WidgetState};
use crate::widget::ChatWidget;

const HELP: &str = "What do you want to know? (/suggest, /brainstorm, /clear, /quit; empty line sends the current draft)";

/// Run the chat until `/quit` or end of input.
pub async fn run_chat<R, W>(widget: &mut ChatWidget, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Starting terminal chat session...");
    output.write_all(format!("{}\n", HELP).as_bytes()).await?;

    let mut lines = input.lines();
    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim_end_matches('\r');

        let shown = widget.session().transcript().len();
        match line {
            "/quit" => break,
            "/clear" => {
                widget.dispatch(UiEvent::Clear).await;
                output.write_all(b"Cleared.\n").await?;
                continue;
            }
            "/suggest" => {
                widget.dispatch(UiEvent::SuggestActivity).await;
                print_draft(widget, output).await?;
                continue;
            }
            "/brainstorm" => {
                widget.dispatch(UiEvent::BrainstormNames).await;
                print_draft(widget, output).await?;
                continue;
            }
            "" => {
                widget.dispatch(UiEvent::Submit).await;
            }
            text => {
                widget.dispatch(UiEvent::Edit { text: text.to_string() }).await;
                widget.dispatch(UiEvent::Submit).await;
            }
        }

        let session = widget.session();
        for message in session.transcript().iter().skip(shown) {
            output
                .write_all(format!("{} : {}\n", message.role, message.text).as_bytes())
                .await?;
        }
        if session.state() == WidgetState::ErrorShown {
            output
                .write_all(format!("Error: {}\n", session.error_message()).as_bytes())
                .await?;
        }
    }

    output.flush().await?;
    info!("Terminal chat session finished.");
    Ok(())
}

async fn print_draft<W: AsyncWrite + Unpin>(widget: &ChatWidget, output: &mut W) -> Result<()> {
    output
        .write_all(format!("Draft: {} (press Enter to send)\n", widget.session().draft_input()).as_bytes())
        .await?;
    Ok(())
}
