//! JSON-RPC control server for the SC126 emulator.
//!
//! Exposes the board over stdin/stdout as newline-delimited JSON-RPC
//! 2.0: boot, reset, ROM and snapshot handling, timed bursts, console
//! input/output and state inspection. Purely headless; scripts and
//! agents drive the emulator without a terminal.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::board::{STEPS_PER_BURST, Sc126};
use crate::config::Sc126Config;
use crate::snapshot;

// ---------------------------------------------------------------------------
// JSON-RPC types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RpcRequest {
    jsonrpc: String,
    method: String,
    #[serde(default)]
    params: JsonValue,
    id: JsonValue,
}

#[derive(Serialize)]
struct RpcResponse {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
    id: JsonValue,
}

#[derive(Serialize)]
struct RpcError {
    code: i32,
    message: String,
}

impl RpcResponse {
    fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: "2.0",
            result: Some(result),
            error: None,
            id,
        }
    }

    fn error(id: JsonValue, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            result: None,
            error: Some(RpcError { code, message }),
            id,
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Control server wrapping a headless board instance.
pub struct McpServer {
    board: Option<Sc126>,
}

impl McpServer {
    #[must_use]
    pub fn new() -> Self {
        Self { board: None }
    }

    /// Run the server loop: read JSON-RPC from stdin, write responses
    /// to stdout, until stdin closes.
    pub fn run(&mut self) {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<RpcRequest>(line) {
                Ok(request) if request.jsonrpc == "2.0" => {
                    self.dispatch(&request.method, &request.params, request.id)
                }
                Ok(request) => RpcResponse::error(
                    request.id,
                    -32600,
                    "Invalid JSON-RPC version".to_string(),
                ),
                Err(err) => {
                    RpcResponse::error(JsonValue::Null, -32700, format!("Parse error: {err}"))
                }
            };

            let _ = writeln!(
                stdout,
                "{}",
                serde_json::to_string(&response).unwrap_or_default()
            );
            let _ = stdout.flush();
        }
    }

    /// Dispatch a method call to the appropriate handler.
    fn dispatch(&mut self, method: &str, params: &JsonValue, id: JsonValue) -> RpcResponse {
        match method {
            "boot" => self.handle_boot(params, id),
            "reset" => self.handle_reset(id),
            "load_snapshot" => self.handle_load_snapshot(params, id),
            "save_snapshot" => self.handle_save_snapshot(params, id),
            "run" => self.handle_run(params, id),
            "step_instruction" => self.handle_step_instruction(id),
            "paste" => self.handle_paste(params, id),
            "send_byte" => self.handle_send_byte(params, id),
            "read_output" => self.handle_read_output(id),
            "peek" => self.handle_peek(params, id),
            "regs" => self.handle_regs(id),
            _ => RpcResponse::error(id, -32601, format!("Unknown method: {method}")),
        }
    }

    /// Ensure a board exists, returning a mutable reference.
    fn require_board(&mut self, id: &JsonValue) -> Result<&mut Sc126, RpcResponse> {
        match self.board.as_mut() {
            Some(board) => Ok(board),
            None => Err(RpcResponse::error(
                id.clone(),
                -32000,
                "No board instance. Call 'boot' first.".to_string(),
            )),
        }
    }

    // === Handlers ===

    fn handle_boot(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(rom_path) = params.get("rom").and_then(JsonValue::as_str) else {
            return RpcResponse::error(id, -32602, "Missing 'rom' path".to_string());
        };
        let rom = match std::fs::read(rom_path) {
            Ok(data) => data,
            Err(err) => {
                return RpcResponse::error(id, -32000, format!("Failed to read ROM: {err}"));
            }
        };

        let mut config = Sc126Config::new(rom);
        config.snapshot_path = params
            .get("snapshot")
            .and_then(JsonValue::as_str)
            .map(PathBuf::from);
        let board = Sc126::new(&config);

        let board_id = board.id();
        self.board = Some(board);
        RpcResponse::success(id, json!({"status": "ok", "board": board_id}))
    }

    fn handle_reset(&mut self, id: JsonValue) -> RpcResponse {
        match self.require_board(&id) {
            Ok(board) => {
                board.reset();
                RpcResponse::success(id, json!({"status": "ok"}))
            }
            Err(resp) => resp,
        }
    }

    fn handle_load_snapshot(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(path) = params.get("path").and_then(JsonValue::as_str) else {
            return RpcResponse::error(id, -32602, "Missing 'path'".to_string());
        };
        let path = path.to_string();
        match self.require_board(&id) {
            Ok(board) => match snapshot::load(Path::new(&path)) {
                Some(ram) => {
                    board.restore_ram(&ram);
                    RpcResponse::success(id, json!({"status": "ok"}))
                }
                None => RpcResponse::error(
                    id,
                    -32000,
                    "Snapshot missing or wrong size".to_string(),
                ),
            },
            Err(resp) => resp,
        }
    }

    fn handle_save_snapshot(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(path) = params.get("path").and_then(JsonValue::as_str) else {
            return RpcResponse::error(id, -32602, "Missing 'path'".to_string());
        };
        let path = path.to_string();
        match self.require_board(&id) {
            Ok(board) => {
                let ram = board.ram_snapshot();
                match snapshot::save(Path::new(&path), &ram) {
                    Ok(()) => RpcResponse::success(id, json!({"status": "ok"})),
                    Err(err) => RpcResponse::error(id, -32000, err.to_string()),
                }
            }
            Err(resp) => resp,
        }
    }

    fn handle_run(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let bursts = params
            .get("bursts")
            .and_then(JsonValue::as_u64)
            .unwrap_or(1);
        let steps = params
            .get("steps")
            .and_then(JsonValue::as_u64)
            .unwrap_or(STEPS_PER_BURST as u64) as usize;

        match self.require_board(&id) {
            Ok(board) => {
                let mut emitted = 0usize;
                for _ in 0..bursts {
                    emitted += board.run_burst(steps).len();
                }
                RpcResponse::success(
                    id,
                    json!({
                        "status": "ok",
                        "emitted": emitted,
                        "cycles": board.cycles(),
                        "halted": board.cpu().regs.halted,
                    }),
                )
            }
            Err(resp) => resp,
        }
    }

    fn handle_step_instruction(&mut self, id: JsonValue) -> RpcResponse {
        match self.require_board(&id) {
            Ok(board) => {
                let cycles = board.step();
                RpcResponse::success(
                    id,
                    json!({"cycles": cycles, "pc": board.cpu().regs.pc}),
                )
            }
            Err(resp) => resp,
        }
    }

    fn handle_paste(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(text) = params.get("text").and_then(JsonValue::as_str) else {
            return RpcResponse::error(id, -32602, "Missing 'text'".to_string());
        };
        let text = text.to_string();
        match self.require_board(&id) {
            Ok(board) => {
                board.paste(&text);
                RpcResponse::success(id, json!({"queued": board.pending_input()}))
            }
            Err(resp) => resp,
        }
    }

    fn handle_send_byte(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(value) = params.get("value").and_then(JsonValue::as_u64) else {
            return RpcResponse::error(id, -32602, "Missing 'value'".to_string());
        };
        if value > 0xFF {
            return RpcResponse::error(id, -32602, "Byte out of range".to_string());
        }
        match self.require_board(&id) {
            Ok(board) => {
                board.send_byte(value as u8);
                RpcResponse::success(id, json!({"queued": board.pending_input()}))
            }
            Err(resp) => resp,
        }
    }

    fn handle_read_output(&mut self, id: JsonValue) -> RpcResponse {
        match self.require_board(&id) {
            Ok(board) => {
                let bytes = board.take_transcript();
                RpcResponse::success(
                    id,
                    json!({
                        "text": String::from_utf8_lossy(&bytes),
                        "length": bytes.len(),
                    }),
                )
            }
            Err(resp) => resp,
        }
    }

    fn handle_peek(&mut self, params: &JsonValue, id: JsonValue) -> RpcResponse {
        let Some(address) = params.get("address").and_then(JsonValue::as_u64) else {
            return RpcResponse::error(id, -32602, "Missing 'address'".to_string());
        };
        if address > 0xFFFF {
            return RpcResponse::error(id, -32602, "Address out of range".to_string());
        }
        match self.require_board(&id) {
            Ok(board) => {
                let value = board.bus().mmu.read(address as u16);
                let physical = board.bus().mmu.translate(address as u16);
                RpcResponse::success(id, json!({"value": value, "physical": physical}))
            }
            Err(resp) => resp,
        }
    }

    fn handle_regs(&mut self, id: JsonValue) -> RpcResponse {
        match self.require_board(&id) {
            Ok(board) => {
                let regs = &board.cpu().regs;
                RpcResponse::success(
                    id,
                    json!({
                        "af": regs.af(),
                        "bc": regs.bc(),
                        "de": regs.de(),
                        "hl": regs.hl(),
                        "ix": regs.ix,
                        "iy": regs.iy,
                        "sp": regs.sp,
                        "pc": regs.pc,
                        "i": regs.i,
                        "r": regs.r,
                        "im": regs.im,
                        "iff1": regs.iff1,
                        "halted": regs.halted,
                        "cycles": board.cycles(),
                    }),
                )
            }
            Err(resp) => resp,
        }
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}
