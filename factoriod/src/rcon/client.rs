//! The lazily-connecting console client.

use std::collections::BTreeMap;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use super::codec::{
    Packet, SERVERDATA_AUTH, SERVERDATA_AUTH_RESPONSE, SERVERDATA_EXECCOMMAND,
    SERVERDATA_RESPONSE_VALUE,
};
use super::error::{RconError, RconResult};
use super::parser;

/// Script that sums rocket-launched items across all player forces and
/// prints them as JSON.
const ITEMS_LAUNCHED_SCRIPT: &str = "/sc local launched = {}
for _, p in pairs(game.players) do
  for item, count in pairs(p.force.items_launched) do
    if launched[item] ~= nil then
      launched[item] = launched[item] + count
    else
      launched[item] = count
    end
  end
end
rcon.print(game.table_to_json(launched))";

/// Remote console client for a running server.
///
/// No connection is made at construction: the first command after
/// [`configure`](RconClient::configure) dials and authenticates, and a
/// failed exchange drops the connection so the next command redials.
pub struct RconClient {
    address: String,
    state: Mutex<ClientState>,
}

#[derive(Default)]
struct ClientState {
    password: Option<String>,
    connection: Option<Connection>,
}

impl RconClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: Mutex::new(ClientState::default()),
        }
    }

    /// Set (or replace) the console password.
    ///
    /// Any live connection is torn down so the next command authenticates
    /// with the new password.
    pub async fn configure(&self, password: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.password = Some(password.into());
        state.connection = None;
    }

    /// Send a raw console command and return the unparsed reply.
    pub async fn send_custom_command(&self, command: &str) -> RconResult<String> {
        self.send_command(command).await
    }

    /// List the names of players currently online.
    pub async fn list_online_players(&self) -> RconResult<Vec<String>> {
        let reply = self.send_command("/players online").await?;
        parser::online_players(&reply)
    }

    /// Items launched in rockets, summed across all forces.
    pub async fn get_items_launched(&self) -> RconResult<BTreeMap<String, u64>> {
        let reply = self.send_command(ITEMS_LAUNCHED_SCRIPT).await?;
        parser::items_launched(&reply)
    }

    async fn send_command(&self, command: &str) -> RconResult<String> {
        let mut state = self.state.lock().await;

        let password = state
            .password
            .clone()
            .ok_or(RconError::ConfigurationRequired)?;

        let mut connection = match state.connection.take() {
            Some(connection) => connection,
            None => Connection::open(&self.address, &password).await?,
        };

        match connection.exec(command).await {
            Ok(reply) => {
                state.connection = Some(connection);
                Ok(reply)
            }
            // The connection stays torn down so the next command redials.
            Err(e) => Err(e),
        }
    }
}

/// An authenticated console connection.
struct Connection {
    stream: TcpStream,
    next_id: i32,
}

impl Connection {
    async fn open(address: &str, password: &str) -> RconResult<Self> {
        debug!(address, "connecting to remote console");
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| RconError::Connect {
                addr: address.to_string(),
                source,
            })?;

        let mut connection = Self { stream, next_id: 1 };
        connection.authenticate(password).await?;
        Ok(connection)
    }

    async fn authenticate(&mut self, password: &str) -> RconResult<()> {
        let auth_id = self.take_id();
        self.write_packet(Packet::new(auth_id, SERVERDATA_AUTH, password))
            .await?;

        // Some servers preface the auth response with an empty response
        // frame; skip anything until the auth response arrives.
        loop {
            let packet = Packet::read_from(&mut self.stream).await?;
            if packet.kind != SERVERDATA_AUTH_RESPONSE {
                continue;
            }
            if packet.id == auth_id {
                return Ok(());
            }
            return Err(RconError::AuthFailed);
        }
    }

    async fn exec(&mut self, command: &str) -> RconResult<String> {
        let id = self.take_id();
        self.write_packet(Packet::new(id, SERVERDATA_EXECCOMMAND, command))
            .await?;

        loop {
            let packet = Packet::read_from(&mut self.stream).await?;
            if packet.kind == SERVERDATA_RESPONSE_VALUE && packet.id == id {
                return Ok(packet.body);
            }
            // Stale frames from a previous, abandoned exchange are skipped.
        }
    }

    async fn write_packet(&mut self, packet: Packet) -> RconResult<()> {
        self.stream.write_all(&packet.encode()).await?;
        Ok(())
    }

    fn take_id(&mut self) -> i32 {
        let id = self.next_id;
        // -1 is the auth-failure sentinel and must never be issued.
        self.next_id = if self.next_id >= i32::MAX - 1 {
            1
        } else {
            self.next_id + 1
        };
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    /// A scripted console server: authenticates any password except
    /// `"wrong"` and answers every command with `reply`.
    async fn fake_server(reply: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let connections = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&connections);

        tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(_) => return,
                };
                counter.fetch_add(1, Ordering::SeqCst);

                tokio::spawn(async move {
                    // auth exchange
                    let auth = match Packet::read_from(&mut stream).await {
                        Ok(packet) => packet,
                        Err(_) => return,
                    };
                    let auth_id = if auth.body == "wrong" { -1 } else { auth.id };
                    let response = Packet::new(auth_id, SERVERDATA_AUTH_RESPONSE, "");
                    if stream.write_all(&response.encode()).await.is_err() {
                        return;
                    }

                    // command loop
                    while let Ok(packet) = Packet::read_from(&mut stream).await {
                        let response =
                            Packet::new(packet.id, SERVERDATA_RESPONSE_VALUE, reply);
                        if stream.write_all(&response.encode()).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });

        (address, connections)
    }

    #[tokio::test]
    async fn test_command_without_configuration_fails() {
        let client = RconClient::new("127.0.0.1:0");
        let result = client.send_custom_command("/help").await;
        assert!(matches!(result, Err(RconError::ConfigurationRequired)));
    }

    #[tokio::test]
    async fn test_lazy_connect_and_command() {
        let (address, connections) = fake_server("pong").await;
        let client = RconClient::new(address);
        client.configure("secret").await;

        // nothing has dialed yet
        assert_eq!(connections.load(Ordering::SeqCst), 0);

        let reply = client.send_custom_command("/ping").await.unwrap();
        assert_eq!(reply, "pong");
        assert_eq!(connections.load(Ordering::SeqCst), 1);

        // the connection is reused for subsequent commands
        client.send_custom_command("/ping").await.unwrap();
        assert_eq!(connections.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reconfigure_reconnects() {
        let (address, connections) = fake_server("ok").await;
        let client = RconClient::new(address);

        client.configure("first").await;
        client.send_custom_command("/ping").await.unwrap();
        assert_eq!(connections.load(Ordering::SeqCst), 1);

        client.configure("second").await;
        client.send_custom_command("/ping").await.unwrap();
        assert_eq!(connections.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_password_is_auth_failed() {
        let (address, _) = fake_server("ok").await;
        let client = RconClient::new(address);
        client.configure("wrong").await;

        let result = client.send_custom_command("/ping").await;
        assert!(matches!(result, Err(RconError::AuthFailed)));
    }

    #[tokio::test]
    async fn test_list_online_players_parses_reply() {
        let (address, _) = fake_server("Online players (2):\n  foo\n  bar").await;
        let client = RconClient::new(address);
        client.configure("secret").await;

        let players = client.list_online_players().await.unwrap();
        assert_eq!(players, vec!["foo", "bar"]);
    }

    #[tokio::test]
    async fn test_items_launched_parses_reply() {
        let (address, _) = fake_server(r#"{"satellite":2,"raw-fish":1}"#).await;
        let client = RconClient::new(address);
        client.configure("secret").await;

        let items = client.get_items_launched().await.unwrap();
        assert_eq!(items["satellite"], 2);
        assert_eq!(items["raw-fish"], 1);
    }
}
