//! Mapped types and a scripted connection shared by the session tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rowmap_core::{
    ColumnAnnotation, Command, Connection, DbValue, Error, IdentifierAnnotation,
    IdentifierStrategy, Mapped, MemberDescriptor, ObjectInfo, Result, Row, SqlQuery,
    TableAnnotation, TypeDescriptor, Value,
};

fn unknown(member: &str) -> Error {
    Error::mapping(format!("no member '{member}'"))
}

/// Database generated identifier.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub body: String,
}

impl Mapped for Note {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>("Note")
            .table(TableAnnotation::new("Notes"))
            .member(
                MemberDescriptor::new::<i64>("id")
                    .column(ColumnAnnotation::named("NoteId"))
                    .identifier(IdentifierAnnotation::new()),
            )
            .member(MemberDescriptor::new::<String>("body").column(ColumnAnnotation::named("Body")))
    }

    fn object_info(&self) -> Result<Arc<ObjectInfo>> {
        ObjectInfo::for_type::<Self>()
    }

    fn member_value(&self, member: &str) -> Option<Value> {
        Some(match member {
            "id" => self.id.to_value(),
            "body" => self.body.to_value(),
            _ => return None,
        })
    }

    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()> {
        match member {
            "id" => self.id = DbValue::from_value(value)?,
            "body" => self.body = DbValue::from_value(value)?,
            _ => return Err(unknown(member)),
        }
        Ok(())
    }
}

/// Assigned text identifier.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Account {
    pub code: String,
    pub name: String,
}

impl Mapped for Account {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>("Account")
            .table(TableAnnotation::new("Accounts"))
            .member(
                MemberDescriptor::new::<String>("code")
                    .column(ColumnAnnotation::named("Code"))
                    .identifier(IdentifierAnnotation::with_strategy(
                        IdentifierStrategy::Assigned,
                    )),
            )
            .member(MemberDescriptor::new::<String>("name").column(ColumnAnnotation::named("Name")))
    }

    fn object_info(&self) -> Result<Arc<ObjectInfo>> {
        ObjectInfo::for_type::<Self>()
    }

    fn member_value(&self, member: &str) -> Option<Value> {
        Some(match member {
            "code" => self.code.to_value(),
            "name" => self.name.to_value(),
            _ => return None,
        })
    }

    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()> {
        match member {
            "code" => self.code = DbValue::from_value(value)?,
            "name" => self.name = DbValue::from_value(value)?,
            _ => return Err(unknown(member)),
        }
        Ok(())
    }
}

/// What a scripted command was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    NonQuery,
    Scalar,
    Reader,
}

#[derive(Debug, Default)]
pub struct Script {
    pub executed: Vec<(Call, SqlQuery)>,
    pub scalars: VecDeque<Value>,
    pub rows: Vec<Row>,
    pub rows_affected: u64,
    pub fail_with: Option<String>,
    pub completed: usize,
    pub closed: bool,
}

/// Connection recording every command into a shared [`Script`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnection {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnection {
    pub fn new() -> Self {
        let connection = Self::default();
        connection.script().rows_affected = 1;
        connection
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct ScriptedCommand<'conn> {
    connection: &'conn ScriptedConnection,
    query: SqlQuery,
}

impl ScriptedCommand<'_> {
    fn record(&self, call: Call) -> Result<MutexGuard<'_, Script>> {
        let mut script = self.connection.script();
        script.executed.push((call, self.query.clone()));
        if let Some(message) = script.fail_with.clone() {
            return Err(Error::driver(message));
        }
        Ok(script)
    }
}

impl Command for ScriptedCommand<'_> {
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

impl Connection for ScriptedConnection {
    type Command<'conn> = ScriptedCommand<'conn>;

    fn create_command(&mut self, query: &SqlQuery) -> Result<Self::Command<'_>> {
        Ok(ScriptedCommand {
            connection: self,
            query: query.clone(),
        })
    }

    fn command_completed(&mut self) {
        self.script().completed += 1;
    }

    fn close(&mut self) {
        self.script().closed = true;
    }
}
