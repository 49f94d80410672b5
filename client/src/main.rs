use anyhow::Result;
use chat_client::{
    config::Cli,
    display::TerminalDisplay,
    logging,
    transport::{self, ChannelEvent, Connection, WsChannel},
    tui::{self, Tui},
    ui, ChatConnectionClient,
};
use clap::Parser;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::stream::StreamExt;
use tokio::sync::mpsc;

type Client = ChatConnectionClient<TerminalDisplay, WsChannel>;

const PAGE: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_file)?;
    let endpoint = cli.endpoint()?;

    let Connection { channel, mut events } = transport::connect(endpoint.clone());
    let mut client = ChatConnectionClient::new(
        TerminalDisplay::new(endpoint.as_str()),
        channel,
        cli.converter(),
        cli.options(),
    );
    client.initialize();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut client, &mut events).await;
    tui::restore()?;
    terminal.show_cursor()?;

    result
}

async fn run(
    terminal: &mut Tui,
    client: &mut Client,
    events: &mut mpsc::UnboundedReceiver<ChannelEvent>,
) -> Result<()> {
    let mut keys = EventStream::new();

    loop {
        terminal.draw(|f| ui::render(f, client.display(), client.input()))?;

        tokio::select! {
            Some(event) = events.recv() => client.handle_event(event),
            key = keys.next() => match key {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if is_quit(&key) {
                        break;
                    }
                    match key.code {
                        KeyCode::PageUp => client.display_mut().scroll_up(PAGE),
                        KeyCode::PageDown => client.display_mut().scroll_down(PAGE),
                        _ => {
                            client.handle_key(key);
                        }
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
        }
    }

    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
