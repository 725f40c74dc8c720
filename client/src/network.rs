use crate::command::{parse_input, Command, HELP};
use crate::view::MatchView;
use log::{error, info};
use shared::{read_frame, write_frame, ClientFrame, ServerFrame, MAX_FRAME_LEN};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct Client {
    server_addr: String,
    name: String,
    view: MatchView,
}

impl Client {
    pub fn new(server_addr: &str, name: &str) -> Self {
        Client {
            server_addr: server_addr.to_string(),
            name: name.to_string(),
            view: MatchView::new(),
        }
    }

    /// Connects, then feeds user lines from `input` to the server and prints
    /// what comes back until the server closes the connection.
    ///
    /// Running out of input sends `{quit}`. Returns the final view of the game.
    pub async fn run<I>(mut self, input: I) -> Result<MatchView, Box<dyn std::error::Error>>
    where
        I: AsyncBufRead + Unpin,
    {
        info!("Connecting to {}...", self.server_addr);
        let stream = TcpStream::connect(&self.server_addr).await?;
        let (reader, mut writer) = stream.into_split();

        // The first frame is always the display name
        write_frame(&mut writer, &self.name).await?;
        info!("Connected as {}", self.name);

        let (frame_tx, mut frames) = mpsc::unbounded_channel();
        let receiver = spawn_frame_receiver(reader, frame_tx);

        let mut lines = input.lines();
        let mut input_open = true;

        loop {
            tokio::select! {
                frame = frames.recv() => match frame {
                    Some(frame) => {
                        println!("{}", self.view.apply(&frame));
                        if frame == ServerFrame::QuitAck {
                            break;
                        }
                    }
                    None => {
                        info!("Server closed the connection");
                        break;
                    }
                },

                line = lines.next_line(), if input_open => match line? {
                    Some(line) => self.handle_input(&mut writer, &line).await?,
                    None => {
                        input_open = false;
                        write_frame(&mut writer, &ClientFrame::Quit.encode()).await?;
                    }
                },
            }
        }

        receiver.abort();
        Ok(self.view)
    }

    async fn handle_input(
        &mut self,
        writer: &mut OwnedWriteHalf,
        line: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match parse_input(line) {
            Some(Command::Send(frame)) => {
                if let ClientFrame::Move(payload) = &frame {
                    if self.view.in_game() && !self.view.my_turn {
                        println!("(Sending anyway; the server will check the turn.)");
                    }
                    self.view.propose_move(payload);
                }
                write_frame(writer, &frame.encode()).await?;
            }
            Some(Command::Help) => println!("{}", HELP),
            Some(Command::Invalid(hint)) => println!("{}", hint),
            None => {}
        }
        Ok(())
    }
}

/// Spawns the task that reads frames off the socket
fn spawn_frame_receiver<R>(reader: R, frame_tx: mpsc::UnboundedSender<ServerFrame>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        loop {
            match read_frame(&mut reader, MAX_FRAME_LEN).await {
                Ok(Some(line)) => {
                    if frame_tx.send(ServerFrame::decode(&line)).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Error receiving frame: {}", e);
                    break;
                }
            }
        }
    })
}
