//! Shared mocks for the integration tests: a scripted connection recording every
//! command and a listener recording every hook it sees.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rowmap::{Command, Connection, Error, Listener, Mapped, Result, Row, SqlQuery, Value};

/// How a command was executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    NonQuery,
    Scalar,
    Reader,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Executed {
    pub call: Call,
    pub sql: String,
    pub arguments: Vec<Value>,
}

#[derive(Debug, Default)]
pub struct Script {
    pub executed: Vec<Executed>,
    pub scalars: VecDeque<Value>,
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    pub fail_with: Option<String>,
    pub commands_completed: usize,
    pub closed: bool,
}

/// A connection whose results are scripted up front.
///
/// Clones share the same script, so a test keeps one clone to inspect what the
/// session executed.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    script: Arc<Mutex<Script>>,
}

impl MockConnection {
    pub fn new() -> Self {
        let connection = Self::default();
        connection.script().rows_affected = 1;
        connection
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_scalar(&self, value: impl Into<Value>) {
        self.script().scalars.push_back(value.into());
    }

    pub fn set_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        let columns: Arc<[String]> = columns.iter().map(|c| (*c).to_string()).collect();
        self.script().rows = rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.script().executed.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script().executed.iter().map(|e| e.call).collect()
    }

    pub fn fail_with(&self, message: &str) {
        self.script().fail_with = Some(message.to_string());
    }
}

pub struct MockCommand<'conn> {
    connection: &'conn MockConnection,
    query: SqlQuery,
}

impl MockCommand<'_> {
    fn record(&self, call: Call) -> Result<MutexGuard<'_, Script>> {
        let mut script = self.connection.script();
        script.executed.push(Executed {
            call,
            sql: self.query.command_text().to_string(),
            arguments: self.query.arguments().to_vec(),
        });
        match script.fail_with.clone() {
            Some(message) => Err(Error::driver(message)),
            None => Ok(script),
        }
    }
}

impl Command for MockCommand<'_> {
    fn execute_non_query(&mut self) -> Result<u64> {
        Ok(self.record(Call::NonQuery)?.rows_affected)
    }

    fn execute_scalar(&mut self) -> Result<Value> {
        Ok(self
            .record(Call::Scalar)?
            .scalars
            .pop_front()
            .unwrap_or(Value::Null))
    }

    fn execute_reader(&mut self) -> Result<Vec<Row>> {
        Ok(self.record(Call::Reader)?.rows.clone())
    }
}

impl Connection for MockConnection {
    type Command<'conn> = MockCommand<'conn>;

    fn create_command(&mut self, query: &SqlQuery) -> Result<Self::Command<'_>> {
        Ok(MockCommand {
            connection: self,
            query: query.clone(),
        })
    }

    fn command_completed(&mut self) {
        self.script().commands_completed += 1;
    }

    fn close(&mut self) {
        self.script().closed = true;
    }
}

pub type HookLog = Arc<Mutex<Vec<String>>>;

pub fn hook_log() -> HookLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &HookLog) -> Vec<String> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

/// Records `<name>:<hook>` for every hook, plus the identifier or row count passed
/// to after-hooks.
pub struct RecordingListener {
    name: &'static str,
    log: HookLog,
}

impl RecordingListener {
    pub fn new(name: &'static str, log: &HookLog) -> Self {
        Self {
            name,
            log: Arc::clone(log),
        }
    }

    fn record(&self, entry: String) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{}:{entry}", self.name));
    }
}

impl Listener for RecordingListener {
    fn before_insert(&self, _instance: &mut dyn Mapped) -> Result<()> {
        self.record("before_insert".into());
        Ok(())
    }

    fn after_insert(&self, _instance: &mut dyn Mapped, identifier: &Value) -> Result<()> {
        self.record(format!("after_insert({identifier:?})"));
        Ok(())
    }

    fn before_update(&self, _instance: &mut dyn Mapped) -> Result<()> {
        self.record("before_update".into());
        Ok(())
    }

    fn after_update(&self, _instance: &mut dyn Mapped, rows_affected: u64) -> Result<()> {
        self.record(format!("after_update({rows_affected})"));
        Ok(())
    }

    fn before_delete(&self, _instance: &dyn Mapped) -> Result<()> {
        self.record("before_delete".into());
        Ok(())
    }

    fn after_delete(&self, _instance: &dyn Mapped, rows_affected: u64) -> Result<()> {
        self.record(format!("after_delete({rows_affected})"));
        Ok(())
    }
}
