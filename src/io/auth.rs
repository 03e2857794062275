// OAuth token storage, refresh and first sign-in
use crate::error::{FetchError, StartupError};
use chrono::{DateTime, Datelike, Duration, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080";
const DRIVE_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/drive.readonly";
const SIGNIN_STATE: &str = "kura-signin";
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Token file layout shared with the golang.org/x/oauth2 tooling.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    /// Go writes its zero time (`0001-01-01T00:00:00Z`) for tokens that never expire.
    fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry.filter(|expiry| expiry.year() > 1)
    }

    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.expiry() {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_MARGIN_SECS) <= now,
            None => false,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
struct ClientInfo {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    auth_uri: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl ClientInfo {
    fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }

    /// First registered loopback redirect, or `http://localhost:8080`.
    fn redirect_uri(&self) -> &str {
        self.redirect_uris
            .iter()
            .find(|uri| uri.starts_with("http://localhost") || uri.starts_with("http://127.0.0.1"))
            .map(String::as_str)
            .unwrap_or(DEFAULT_REDIRECT_URI)
    }

    fn consent_url(&self) -> Result<Url, FetchError> {
        let base = self.auth_uri.as_deref().unwrap_or(DEFAULT_AUTH_URI);
        Url::parse_with_params(
            base,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri()),
                ("response_type", "code"),
                ("scope", DRIVE_READONLY_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", SIGNIN_STATE),
            ],
        )
        .map_err(|e| FetchError::Auth(format!("bad auth uri {}: {}", base, e)))
    }

    fn exchange_form<'a>(&'a self, code: &'a str) -> [(&'static str, &'a str); 5] {
        [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri()),
            ("grant_type", "authorization_code"),
        ]
    }
}

#[derive(Deserialize)]
struct ClientSecrets {
    installed: Option<ClientInfo>,
    web: Option<ClientInfo>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    /// Missing fields fall back to `previous`, so a refresh keeps its refresh token.
    fn into_token(self, previous: Option<&StoredToken>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            token_type: self
                .token_type
                .or_else(|| previous.map(|p| p.token_type.clone()))
                .unwrap_or_else(|| "Bearer".to_string()),
            refresh_token: self
                .refresh_token
                .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
            expiry: self
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }
}

/// Outcome of one request hitting the loopback redirect.
#[derive(Debug, PartialEq)]
enum Callback {
    Code(String),
    Denied(String),
    Ignored,
}

/// Reads the `code` out of `GET /?state=..&code=.. HTTP/1.1`.
fn parse_callback(request_line: &str) -> Callback {
    let Some(target) = request_line.split_whitespace().nth(1) else {
        return Callback::Ignored;
    };
    let Ok(url) = Url::parse(&format!("http://localhost{}", target)) else {
        return Callback::Ignored;
    };
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match &*key {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => return Callback::Denied(value.into_owned()),
            _ => {}
        }
    }
    match (code, state.as_deref()) {
        (Some(code), Some(SIGNIN_STATE)) => Callback::Code(code),
        _ => Callback::Ignored,
    }
}

fn respond(stream: &mut impl Write, status: &str, body: &str) -> io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )?;
    stream.flush()
}

/// Serves the redirect target until the browser delivers a code or a denial.
fn wait_for_code(listener: &TcpListener) -> Result<String, FetchError> {
    for stream in listener.incoming() {
        let mut stream = stream?;
        let mut line = String::new();
        BufReader::new(&stream).read_line(&mut line)?;
        match parse_callback(&line) {
            Callback::Code(code) => {
                respond(&mut stream, "200 OK", "Authorization complete. You can close this window.")?;
                return Ok(code);
            }
            Callback::Denied(reason) => {
                respond(&mut stream, "200 OK", "Authorization was not granted.")?;
                return Err(FetchError::Auth(format!("consent denied: {}", reason)));
            }
            Callback::Ignored => respond(&mut stream, "404 Not Found", "")?,
        }
    }
    Err(FetchError::Auth("sign-in listener closed".to_string()))
}

/// Writes the token readable by the owner only.
fn save_token(path: &Path, token: &StoredToken) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        let file = options.open(path)?;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        serde_json::to_writer(&file, token)?;
    }
    #[cfg(not(unix))]
    {
        let file = options.open(path)?;
        serde_json::to_writer(&file, token)?;
    }
    Ok(())
}

fn read_client(credentials_path: &Path) -> Result<Option<ClientInfo>, StartupError> {
    match fs::read_to_string(credentials_path) {
        Ok(raw) => {
            let secrets: ClientSecrets =
                serde_json::from_str(&raw).map_err(|source| StartupError::Parse {
                    what: "client credentials",
                    source,
                })?;
            Ok(secrets.installed.or(secrets.web))
        }
        Err(e) => {
            warn!(path = %credentials_path.display(), error = %e, "no client credentials, token refresh disabled");
            Ok(None)
        }
    }
}

/// Browser consent through a loopback redirect, then a code exchange.
fn authorize(http: &reqwest::blocking::Client, client: &ClientInfo) -> Result<StoredToken, FetchError> {
    let redirect = Url::parse(client.redirect_uri())
        .map_err(|e| FetchError::Auth(format!("bad redirect uri: {}", e)))?;
    let port = redirect.port_or_known_default().unwrap_or(80);
    let listener = TcpListener::bind(("127.0.0.1", port))?;
    let url = client.consent_url()?;

    info!(port, "waiting for browser sign-in");
    eprintln!("kura: sign in to Google Drive in your browser. If it does not open, visit:\n{}", url);
    if let Err(e) = open::that(url.as_str()) {
        warn!(error = %e, "could not open browser");
    }

    let code = wait_for_code(&listener)?;
    let response = http
        .post(client.token_uri())
        .form(&client.exchange_form(&code))
        .send()?;
    if !response.status().is_success() {
        return Err(FetchError::Auth(format!(
            "code exchange rejected with {}",
            response.status()
        )));
    }
    let body: TokenResponse = response.json()?;
    info!("signed in through browser consent");
    Ok(body.into_token(None))
}

pub struct Credentials {
    token: Mutex<StoredToken>,
    token_path: PathBuf,
    client: Option<ClientInfo>,
}

impl Credentials {
    /// Reads `token.json`, running the browser sign-in first when it does not exist yet.
    pub fn load(token_path: &Path, credentials_path: &Path) -> Result<Self, StartupError> {
        let client = read_client(credentials_path)?;

        let token = match fs::read_to_string(token_path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| StartupError::Parse {
                what: "token file",
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let client = client.as_ref().ok_or_else(|| StartupError::ReadFile {
                    path: credentials_path.display().to_string(),
                    source: io::Error::new(
                        io::ErrorKind::NotFound,
                        "client credentials are needed for the first sign-in",
                    ),
                })?;
                let http = reqwest::blocking::Client::new();
                let token = authorize(&http, client)?;
                save_token(token_path, &token)?;
                info!(path = %token_path.display(), "token saved");
                token
            }
            Err(source) => {
                return Err(StartupError::ReadFile {
                    path: token_path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self {
            token: Mutex::new(token),
            token_path: token_path.to_path_buf(),
            client,
        })
    }

    #[cfg(test)]
    pub fn from_token(token: StoredToken) -> Self {
        Self {
            token: Mutex::new(token),
            token_path: PathBuf::new(),
            client: None,
        }
    }

    /// Current access token, refreshed first when it is about to expire.
    pub fn access_token(&self, http: &reqwest::blocking::Client) -> Result<String, FetchError> {
        let mut token = self
            .token
            .lock()
            .map_err(|_| FetchError::Auth("token lock poisoned".to_string()))?;
        if token.needs_refresh(Utc::now()) {
            let refreshed = self.refresh(http, &token)?;
            *token = refreshed;
            if let Err(e) = self.persist(&token) {
                warn!(error = %e, "could not save refreshed token");
            }
        }
        Ok(token.access_token.clone())
    }

    fn refresh(
        &self,
        http: &reqwest::blocking::Client,
        current: &StoredToken,
    ) -> Result<StoredToken, FetchError> {
        let refresh_token = current
            .refresh_token
            .as_deref()
            .ok_or_else(|| FetchError::Auth("token expired and has no refresh token".to_string()))?;
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| FetchError::Auth("token expired and no client credentials".to_string()))?;

        let response = http
            .post(client.token_uri())
            .form(&[
                ("client_id", client.client_id.as_str()),
                ("client_secret", client.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()?;
        if !response.status().is_success() {
            return Err(FetchError::Auth(format!(
                "token refresh rejected with {}",
                response.status()
            )));
        }
        let body: TokenResponse = response.json()?;
        info!("access token refreshed");
        Ok(body.into_token(Some(current)))
    }

    fn persist(&self, token: &StoredToken) -> Result<(), FetchError> {
        if self.token_path.as_os_str().is_empty() {
            return Ok(());
        }
        save_token(&self.token_path, token)
    }
}
