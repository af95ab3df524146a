//! Mapped types shared by the dialect tests.

use std::sync::Arc;

use rowmap_core::{
    ColumnAnnotation, DbValue, Error, IdentifierAnnotation, IdentifierStrategy, Mapped,
    MemberDescriptor, ObjectInfo, Result, TableAnnotation, TargetType, TypeConverter,
    TypeDescriptor, Value, ValueKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomerStatus {
    #[default]
    Active = 1,
    Suspended = 2,
}

impl DbValue for CustomerStatus {
    const KIND: ValueKind = ValueKind::Int;

    fn to_value(&self) -> Value {
        Value::Int(*self as i32)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(1) => Ok(CustomerStatus::Active),
            Value::Int(2) => Ok(CustomerStatus::Suspended),
            other => Err(Error::conversion(
                other.type_name(),
                "CustomerStatus",
                "unknown status",
            )),
        }
    }

    fn default_value() -> Value {
        Value::Int(1)
    }
}

fn unknown(member: &str) -> Error {
    Error::mapping(format!("no member '{member}'"))
}

/// Assigned identifier, one insert-only and one update-only column, one unmapped
/// member.
#[derive(Debug, Default)]
pub struct Customer {
    pub created: String,
    pub dob: String,
    pub id: i32,
    pub name: String,
    pub status: CustomerStatus,
    pub updated: Option<String>,
    pub scratch: String,
}

impl Customer {
    pub fn sample() -> Self {
        Customer {
            created: "2024-03-01".into(),
            dob: "1970-01-01".into(),
            id: 1234,
            name: "Joe Bloggs".into(),
            status: CustomerStatus::Active,
            updated: None,
            scratch: String::new(),
        }
    }
}

impl Mapped for Customer {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>("Customer")
            .table(TableAnnotation::new("Customers").schema("Sales"))
            .member(
                MemberDescriptor::new::<String>("created")
                    .column(ColumnAnnotation::named("Created").allow_update(false)),
            )
            .member(MemberDescriptor::new::<String>("dob").column(ColumnAnnotation::named("DoB")))
            .member(
                MemberDescriptor::new::<i32>("id")
                    .column(ColumnAnnotation::named("CustomerId"))
                    .identifier(IdentifierAnnotation::with_strategy(
                        IdentifierStrategy::Assigned,
                    )),
            )
            .member(MemberDescriptor::new::<String>("name").column(ColumnAnnotation::named("Name")))
            .member(
                MemberDescriptor::new::<CustomerStatus>("status")
                    .column(ColumnAnnotation::named("StatusId")),
            )
            .member(
                MemberDescriptor::new::<Option<String>>("updated")
                    .column(ColumnAnnotation::named("Updated").allow_insert(false)),
            )
            .member(MemberDescriptor::new::<String>("scratch"))
    }

    fn object_info(&self) -> Result<Arc<ObjectInfo>> {
        ObjectInfo::for_type::<Self>()
    }

    fn member_value(&self, member: &str) -> Option<Value> {
        Some(match member {
            "created" => self.created.to_value(),
            "dob" => self.dob.to_value(),
            "id" => self.id.to_value(),
            "name" => self.name.to_value(),
            "status" => self.status.to_value(),
            "updated" => self.updated.to_value(),
            "scratch" => self.scratch.to_value(),
            _ => return None,
        })
    }

    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()> {
        match member {
            "created" => self.created = DbValue::from_value(value)?,
            "dob" => self.dob = DbValue::from_value(value)?,
            "id" => self.id = DbValue::from_value(value)?,
            "name" => self.name = DbValue::from_value(value)?,
            "status" => self.status = DbValue::from_value(value)?,
            "updated" => self.updated = DbValue::from_value(value)?,
            "scratch" => self.scratch = DbValue::from_value(value)?,
            _ => return Err(unknown(member)),
        }
        Ok(())
    }
}

/// Database generated identifier.
#[derive(Debug, Default)]
pub struct Invoice {
    pub id: i64,
    pub total: f64,
    pub note: Option<String>,
}

impl Mapped for Invoice {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>("Invoice")
            .table(TableAnnotation::new("Invoices"))
            .member(
                MemberDescriptor::new::<i64>("id")
                    .column(ColumnAnnotation::named("InvoiceId"))
                    .identifier(IdentifierAnnotation::new()),
            )
            .member(MemberDescriptor::new::<f64>("total").column(ColumnAnnotation::named("Total")))
            .member(
                MemberDescriptor::new::<Option<String>>("note")
                    .column(ColumnAnnotation::named("Note")),
            )
    }

    fn object_info(&self) -> Result<Arc<ObjectInfo>> {
        ObjectInfo::for_type::<Self>()
    }

    fn member_value(&self, member: &str) -> Option<Value> {
        Some(match member {
            "id" => self.id.to_value(),
            "total" => self.total.to_value(),
            "note" => self.note.to_value(),
            _ => return None,
        })
    }

    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()> {
        match member {
            "id" => self.id = DbValue::from_value(value)?,
            "total" => self.total = DbValue::from_value(value)?,
            "note" => self.note = DbValue::from_value(value)?,
            _ => return Err(unknown(member)),
        }
        Ok(())
    }
}

/// Sequence identifier with the default sequence name.
#[derive(Debug, Default)]
pub struct Ticket {
    pub id: i64,
    pub title: String,
}

impl Mapped for Ticket {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>("Ticket")
            .table(TableAnnotation::new("tickets"))
            .member(
                MemberDescriptor::new::<i64>("id")
                    .column(ColumnAnnotation::new())
                    .identifier(IdentifierAnnotation::with_strategy(
                        IdentifierStrategy::Sequence,
                    )),
            )
            .member(MemberDescriptor::new::<String>("title").column(ColumnAnnotation::new()))
    }

    fn object_info(&self) -> Result<Arc<ObjectInfo>> {
        ObjectInfo::for_type::<Self>()
    }

    fn member_value(&self, member: &str) -> Option<Value> {
        Some(match member {
            "id" => self.id.to_value(),
            "title" => self.title.to_value(),
            _ => return None,
        })
    }

    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()> {
        match member {
            "id" => self.id = DbValue::from_value(value)?,
            "title" => self.title = DbValue::from_value(value)?,
            _ => return Err(unknown(member)),
        }
        Ok(())
    }
}

/// Only a generated identifier, so inserts write no columns.
#[derive(Debug, Default)]
pub struct AuditEntry {
    pub id: i64,
}

impl Mapped for AuditEntry {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>("AuditEntry")
            .table(TableAnnotation::new("AuditEntries"))
            .member(
                MemberDescriptor::new::<i64>("id")
                    .column(ColumnAnnotation::named("AuditEntryId"))
                    .identifier(IdentifierAnnotation::new()),
            )
    }

    fn object_info(&self) -> Result<Arc<ObjectInfo>> {
        ObjectInfo::for_type::<Self>()
    }

    fn member_value(&self, member: &str) -> Option<Value> {
        (member == "id").then(|| self.id.to_value())
    }

    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()> {
        if member != "id" {
            return Err(unknown(member));
        }
        self.id = DbValue::from_value(value)?;
        Ok(())
    }
}

/// Badge codes are stored upper-cased by [`BadgeCodeConverter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeCode(pub String);

impl DbValue for BadgeCode {
    const KIND: ValueKind = ValueKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.0.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        String::from_value(value).map(BadgeCode)
    }

    fn default_value() -> Value {
        Value::Text(String::new())
    }
}

#[derive(Debug)]
pub struct BadgeCodeConverter;

impl TypeConverter for BadgeCodeConverter {
    fn convert_from_db_value(&self, value: Value, _target: &TargetType) -> Result<Value> {
        Ok(value)
    }

    fn convert_to_db_value(&self, value: Value, _target: &TargetType) -> Result<Value> {
        Ok(match value {
            Value::Text(code) => Value::Text(code.to_ascii_uppercase()),
            other => other,
        })
    }
}

#[derive(Debug, Default)]
pub struct Badge {
    pub code: BadgeCode,
    pub holder: String,
}

impl Mapped for Badge {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>("Badge")
            .table(TableAnnotation::new("Badges"))
            .member(
                MemberDescriptor::new::<BadgeCode>("code")
                    .column(ColumnAnnotation::named("Code"))
                    .identifier(IdentifierAnnotation::with_strategy(
                        IdentifierStrategy::Assigned,
                    )),
            )
            .member(MemberDescriptor::new::<String>("holder").column(ColumnAnnotation::named("Holder")))
    }

    fn object_info(&self) -> Result<Arc<ObjectInfo>> {
        ObjectInfo::for_type::<Self>()
    }

    fn member_value(&self, member: &str) -> Option<Value> {
        Some(match member {
            "code" => self.code.to_value(),
            "holder" => self.holder.to_value(),
            _ => return None,
        })
    }

    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()> {
        match member {
            "code" => self.code = DbValue::from_value(value)?,
            "holder" => self.holder = DbValue::from_value(value)?,
            _ => return Err(unknown(member)),
        }
        Ok(())
    }
}

/// Sequence identifier with a mixed-case table and the default sequence name.
#[derive(Debug, Default)]
pub struct Coupon {
    pub id: i64,
    pub label: String,
}

impl Mapped for Coupon {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new::<Self>("Coupon")
            .table(TableAnnotation::new("Coupons").schema("Promotions"))
            .member(
                MemberDescriptor::new::<i64>("id")
                    .column(ColumnAnnotation::named("CouponId"))
                    .identifier(IdentifierAnnotation::with_strategy(
                        IdentifierStrategy::Sequence,
                    )),
            )
            .member(MemberDescriptor::new::<String>("label").column(ColumnAnnotation::named("Label")))
    }

    fn object_info(&self) -> Result<Arc<ObjectInfo>> {
        ObjectInfo::for_type::<Self>()
    }

    fn member_value(&self, member: &str) -> Option<Value> {
        Some(match member {
            "id" => self.id.to_value(),
            "label" => self.label.to_value(),
            _ => return None,
        })
    }

    fn set_member_value(&mut self, member: &str, value: Value) -> Result<()> {
        match member {
            "id" => self.id = DbValue::from_value(value)?,
            "label" => self.label = DbValue::from_value(value)?,
            _ => return Err(unknown(member)),
        }
        Ok(())
    }
}
