//! Principal and compute objects: roles, users, warehouses.

use super::{MappingContext, ObjectMapping};
use crate::core::{
    ObjectCategory, RoleRecord, StatementBuilder, StatementPair, UserRecord, WarehouseRecord,
};
use crate::error::{Result, TranscribeError};

fn drop_statement(kind: &str, name: &str) -> Result<crate::core::Statement> {
    Ok(StatementBuilder::new("DROP")
        .keyword(kind)
        .keyword("IF EXISTS")
        .ident(name)?
        .build())
}

impl ObjectMapping for RoleRecord {
    const CATEGORY: ObjectCategory = ObjectCategory::Role;

    fn object_name(&self) -> String {
        self.name.clone()
    }

    fn to_statements(&self, _ctx: &MappingContext) -> Result<StatementPair> {
        let create = StatementBuilder::new("CREATE OR REPLACE ROLE")
            .ident(&self.name)?
            .build();
        Ok(StatementPair {
            create,
            drop: Some(drop_statement("ROLE", &self.name)?),
        })
    }
}

impl ObjectMapping for UserRecord {
    const CATEGORY: ObjectCategory = ObjectCategory::User;

    fn object_name(&self) -> String {
        self.name.clone()
    }

    fn to_statements(&self, ctx: &MappingContext) -> Result<StatementPair> {
        // Clause order follows the source column order.
        let create = StatementBuilder::new("CREATE OR REPLACE USER")
            .ident(&self.name)?
            .secret_property("PASSWORD", &ctx.user_password)
            .optional_string_property("LOGIN_NAME", self.login_name.as_deref())
            .optional_string_property("DISPLAY_NAME", self.display_name.as_deref())
            .optional_ident_property("DEFAULT_ROLE", self.default_role.as_deref())?
            .optional_string_property("EMAIL", self.email.as_deref())
            .build();
        Ok(StatementPair {
            create,
            drop: Some(drop_statement("USER", &self.name)?),
        })
    }
}

impl ObjectMapping for WarehouseRecord {
    const CATEGORY: ObjectCategory = ObjectCategory::Warehouse;

    fn object_name(&self) -> String {
        self.name.clone()
    }

    fn to_statements(&self, _ctx: &MappingContext) -> Result<StatementPair> {
        let size = self.size.trim();
        if size.is_empty() {
            return Err(TranscribeError::mapping(
                Self::CATEGORY,
                &self.name,
                "warehouse size is empty",
            ));
        }

        let create = StatementBuilder::new("CREATE OR REPLACE WAREHOUSE")
            .ident(&self.name)?
            .string_property("WAREHOUSE_SIZE", &size.to_ascii_uppercase())
            .bool_property("INITIALLY_SUSPENDED", true)
            .build();
        Ok(StatementPair {
            create,
            drop: Some(drop_statement("WAREHOUSE", &self.name)?),
        })
    }
}
