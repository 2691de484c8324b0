use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::api::dto::GraphDto;
use crate::application::{
    extract_callee_names, job_id_for, list_functions, AnalyzeUsecase, TreeRequest,
};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::infrastructure::progress::MemoryProgressStore;
use crate::infrastructure::TreeSitterCallGraphBuilder;
use crate::ports::ProgressStore;

#[derive(Debug, Deserialize)]
struct CommandReq {
    command: String,
    params: Option<serde_json::Value>,
}

/// State shared by every connection of one server.
#[derive(Default)]
pub struct ServerState {
    pub store: MemoryProgressStore,
    pub config: AnalysisConfig,
    shutdown: AtomicBool,
}

impl ServerState {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

pub fn bind(port: u16) -> Result<TcpListener> {
    let address = format!("127.0.0.1:{}", port);
    TcpListener::bind(&address).with_context(|| format!("Failed to bind to {}", address))
}

pub fn start_server(port: u16, config: AnalysisConfig) -> Result<()> {
    let listener = bind(port)?;
    serve(listener, Arc::new(ServerState::new(config)))
}

/// Accept connections until a client sends SHUTDOWN.
pub fn serve(listener: TcpListener, state: Arc<ServerState>) -> Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "API server listening");

    for stream in listener.incoming() {
        if state.is_shutting_down() {
            break;
        }
        match stream {
            Ok(stream) => {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream, &state, local_addr) {
                        tracing::warn!(error = %e, "connection error");
                    }
                });
            }
            Err(e) => tracing::warn!(error = %e, "accept error"),
        }
    }

    tracing::info!("API server stopped");
    Ok(())
}

fn handle_connection(mut stream: TcpStream, state: &ServerState, local_addr: SocketAddr) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let (response, shutdown) = match serde_json::from_str::<CommandReq>(trimmed) {
            Ok(req) => {
                let shutdown = req.command == "SHUTDOWN";
                (respond(process_command(req, state)), shutdown)
            }
            Err(e) => (
                json!({ "status": "error", "message": format!("Invalid JSON format: {}", e) }),
                false,
            ),
        };

        let response_str = serde_json::to_string(&response)?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;

        if shutdown {
            tracing::info!("shutdown requested");
            state.shutdown.store(true, Ordering::SeqCst);
            // Wake the accept loop so it observes the flag.
            let _ = TcpStream::connect(local_addr);
            break;
        }
    }
    Ok(())
}

fn respond(result: Result<serde_json::Value>) -> serde_json::Value {
    match result {
        Ok(data) => json!({ "status": "success", "data": data }),
        Err(e) => {
            let mut response = json!({ "status": "error", "message": e.to_string() });
            if let Some(AnalysisError::EntryNotFound { available, .. }) = e.downcast_ref::<AnalysisError>() {
                response["available"] = json!(available);
            }
            response
        }
    }
}

fn process_command(req: CommandReq, state: &ServerState) -> Result<serde_json::Value> {
    let params = req.params.unwrap_or(serde_json::Value::Null);
    match req.command.as_str() {
        "PING" => Ok(json!("PONG")),
        "GRAPH" => handle_graph(&params, state),
        "TREE" => handle_tree(&params, state),
        "CALLS" => {
            let source = str_param(&params, "source")?;
            Ok(json!(extract_callee_names(source)?))
        }
        "FUNCTIONS" => {
            let file = PathBuf::from(str_param(&params, "file")?);
            let root = opt_str_param(&params, "root").map(PathBuf::from);
            Ok(serde_json::to_value(list_functions(root.as_deref(), &file)?)?)
        }
        "PROGRESS" => {
            let job = str_param(&params, "job")?;
            let progress = state
                .store
                .get(job)
                .ok_or_else(|| anyhow::anyhow!("Unknown job: {}", job))?;
            Ok(serde_json::to_value(progress)?)
        }
        "SHUTDOWN" => Ok(json!("Shutting down...")),
        _ => anyhow::bail!("Unknown command: {}", req.command),
    }
}

fn handle_graph(params: &serde_json::Value, state: &ServerState) -> Result<serde_json::Value> {
    let root = PathBuf::from(str_param(params, "path")?);
    let job = opt_str_param(params, "job")
        .map(str::to_string)
        .unwrap_or_else(|| job_id_for(&root));

    tracing::info!(root = %root.display(), job = %job, "GRAPH");
    let builder = TreeSitterCallGraphBuilder::new(state.config.clone());
    let usecase = AnalyzeUsecase::new(&builder).with_progress(&state.store);
    let project = usecase.build_call_graph(&root, Some(&job))?;

    Ok(json!({ "job": job, "graph": GraphDto::from(&project) }))
}

fn handle_tree(params: &serde_json::Value, state: &ServerState) -> Result<serde_json::Value> {
    let root = PathBuf::from(str_param(params, "path")?);
    let entry_file = str_param(params, "entry_file")?;
    let mut request = TreeRequest::new(root.clone(), entry_file).max_depth(state.config.max_depth);
    if let Some(function) = opt_str_param(params, "function") {
        request = request.function(function);
    }
    if let Some(depth) = params.get("max_depth").and_then(|v| v.as_u64()) {
        request = request.max_depth(depth as usize);
    }
    let job = opt_str_param(params, "job")
        .map(str::to_string)
        .unwrap_or_else(|| job_id_for(&root));

    tracing::info!(root = %root.display(), entry_file, job = %job, "TREE");
    let builder = TreeSitterCallGraphBuilder::new(state.config.clone());
    let usecase = AnalyzeUsecase::new(&builder).with_progress(&state.store);
    let tree = usecase.build_call_tree(&request, Some(&job))?;

    Ok(serde_json::to_value(tree)?)
}

fn str_param<'p>(params: &'p serde_json::Value, name: &str) -> Result<&'p str> {
    opt_str_param(params, name).ok_or_else(|| anyhow::anyhow!("Missing '{}' param", name))
}

fn opt_str_param<'p>(params: &'p serde_json::Value, name: &str) -> Option<&'p str> {
    params.get(name).and_then(|v| v.as_str())
}
