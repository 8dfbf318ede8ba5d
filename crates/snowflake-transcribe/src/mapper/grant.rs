//! Authorization edges: role-to-user, role-to-role and privilege grants.
//!
//! Grants have no tracked inverse. They disappear with the objects they
//! connect, so rollback only drops objects.

use super::{MappingContext, ObjectMapping};
use crate::core::{
    GrantEdge, GrantObjectType, ObjectCategory, RoleRoleGrant, StatementBuilder, StatementPair,
    UserRoleGrant,
};
use crate::error::{Result, TranscribeError};

const OWNERSHIP: &str = "OWNERSHIP";

impl ObjectMapping for UserRoleGrant {
    const CATEGORY: ObjectCategory = ObjectCategory::UserRoleGrant;

    fn object_name(&self) -> String {
        format!("{} -> {}", self.role, self.user)
    }

    fn to_statements(&self, _ctx: &MappingContext) -> Result<StatementPair> {
        let create = StatementBuilder::new("GRANT ROLE")
            .ident(&self.role)?
            .keyword("TO USER")
            .ident(&self.user)?
            .build();
        Ok(StatementPair { create, drop: None })
    }
}

impl ObjectMapping for RoleRoleGrant {
    const CATEGORY: ObjectCategory = ObjectCategory::RoleRoleGrant;

    fn object_name(&self) -> String {
        format!("{} -> {}", self.role, self.grantee)
    }

    fn to_statements(&self, _ctx: &MappingContext) -> Result<StatementPair> {
        let create = StatementBuilder::new("GRANT ROLE")
            .ident(&self.role)?
            .keyword("TO ROLE")
            .ident(&self.grantee)?
            .build();
        Ok(StatementPair { create, drop: None })
    }
}

impl GrantEdge {
    /// Name parts of the granted object, outermost first.
    ///
    /// Tables and views are `database.schema.object`, schemas are
    /// `database.schema`, warehouses and databases are bare names.
    pub fn object_parts(&self) -> Result<Vec<&str>> {
        let missing = |what: &str| {
            TranscribeError::mapping(
                ObjectCategory::RoleObjectGrant,
                &self.name,
                format!("{} grant has no {}", self.object_type, what),
            )
        };

        match self.object_type {
            GrantObjectType::Table | GrantObjectType::View => {
                let database = self.database.as_deref().ok_or_else(|| missing("database"))?;
                let schema = self.schema.as_deref().ok_or_else(|| missing("schema"))?;
                Ok(vec![database, schema, self.name.as_str()])
            }
            GrantObjectType::Schema => {
                let database = self.database.as_deref().ok_or_else(|| missing("database"))?;
                Ok(vec![database, self.name.as_str()])
            }
            GrantObjectType::Warehouse | GrantObjectType::Database => Ok(vec![self.name.as_str()]),
        }
    }

    /// Whether the grant transfers ownership.
    pub fn is_ownership(&self) -> bool {
        self.privilege.trim().eq_ignore_ascii_case(OWNERSHIP)
    }
}

impl ObjectMapping for GrantEdge {
    const CATEGORY: ObjectCategory = ObjectCategory::RoleObjectGrant;

    fn object_name(&self) -> String {
        let object = self
            .object_parts()
            .map(|parts| parts.join("."))
            .unwrap_or_else(|_| self.name.clone());
        format!(
            "{} on {} {} -> {}",
            self.privilege, self.object_type, object, self.grantee
        )
    }

    fn to_statements(&self, _ctx: &MappingContext) -> Result<StatementPair> {
        let parts = self.object_parts()?;
        let builder = StatementBuilder::new("GRANT")
            .checked_keyword(self.privilege.trim())?
            .keyword("ON")
            .keyword(self.object_type.keyword())
            .qualified(&parts)?
            .keyword("TO ROLE")
            .ident(&self.grantee)?;

        // Ownership moves instead of adding; existing grants on the object
        // must be revoked or the transfer is refused.
        let builder = if self.is_ownership() {
            builder.keyword("REVOKE CURRENT GRANTS")
        } else {
            builder
        };

        Ok(StatementPair {
            create: builder.build(),
            drop: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(privilege: &str, object_type: GrantObjectType) -> GrantEdge {
        GrantEdge {
            privilege: privilege.into(),
            object_type,
            name: "T".into(),
            schema: Some("S".into()),
            database: Some("D".into()),
            grantee: "ANALYST".into(),
        }
    }

    #[test]
    fn test_user_role_grant() {
        let pair = UserRoleGrant {
            role: "ANALYST".into(),
            user: "jane".into(),
        }
        .to_statements(&MappingContext::default())
        .unwrap();
        assert_eq!(pair.create.sql(), "GRANT ROLE \"ANALYST\" TO USER \"jane\"");
        assert!(pair.drop.is_none());
    }

    #[test]
    fn test_role_role_grant() {
        let pair = RoleRoleGrant {
            role: "ANALYST".into(),
            grantee: "SYSADMIN".into(),
        }
        .to_statements(&MappingContext::default())
        .unwrap();
        assert_eq!(pair.create.sql(), "GRANT ROLE \"ANALYST\" TO ROLE \"SYSADMIN\"");
        assert!(pair.drop.is_none());
    }

    #[test]
    fn test_table_is_three_part() {
        let e = edge("SELECT", GrantObjectType::Table);
        let parts = e.object_parts().unwrap();
        assert_eq!(parts.join("."), "D.S.T");
    }

    #[test]
    fn test_view_is_three_part() {
        let e = edge("SELECT", GrantObjectType::View);
        let parts = e.object_parts().unwrap();
        assert_eq!(parts, vec!["D", "S", "T"]);
    }

    #[test]
    fn test_schema_is_two_part() {
        let mut e = edge("USAGE", GrantObjectType::Schema);
        e.name = "S".into();
        e.schema = None;
        assert_eq!(e.object_parts().unwrap().join("."), "D.S");
    }

    #[test]
    fn test_warehouse_is_unqualified() {
        let e = edge("USAGE", GrantObjectType::Warehouse);
        let parts = e.object_parts().unwrap();
        assert_eq!(parts.join("."), "T");
    }

    #[test]
    fn test_database_is_unqualified() {
        let e = edge("USAGE", GrantObjectType::Database);
        let parts = e.object_parts().unwrap();
        assert_eq!(parts, vec!["T"]);
    }

    #[test]
    fn test_table_without_schema_is_mapping_error() {
        let mut e = edge("SELECT", GrantObjectType::Table);
        e.schema = None;
        let err = e.to_statements(&MappingContext::default()).unwrap_err();
        assert!(err.to_string().contains("has no schema"));
    }

    #[test]
    fn test_select_grant_statement() {
        let pair = edge("SELECT", GrantObjectType::Table)
            .to_statements(&MappingContext::default())
            .unwrap();
        assert_eq!(
            pair.create.sql(),
            "GRANT SELECT ON TABLE \"D\".\"S\".\"T\" TO ROLE \"ANALYST\""
        );
        assert!(!pair.create.sql().contains("REVOKE CURRENT GRANTS"));
        assert!(pair.drop.is_none());
    }

    #[test]
    fn test_ownership_revokes_current_grants() {
        let pair = edge("OWNERSHIP", GrantObjectType::Table)
            .to_statements(&MappingContext::default())
            .unwrap();
        assert_eq!(
            pair.create.sql(),
            "GRANT OWNERSHIP ON TABLE \"D\".\"S\".\"T\" TO ROLE \"ANALYST\" REVOKE CURRENT GRANTS"
        );
    }

    #[test]
    fn test_multi_word_privilege() {
        let mut e = edge("CREATE TABLE", GrantObjectType::Schema);
        e.name = "S".into();
        let pair = e.to_statements(&MappingContext::default()).unwrap();
        assert_eq!(
            pair.create.sql(),
            "GRANT CREATE TABLE ON SCHEMA \"D\".\"S\" TO ROLE \"ANALYST\""
        );
    }

    #[test]
    fn test_object_name_for_reports() {
        let e = edge("SELECT", GrantObjectType::Table);
        assert_eq!(e.object_name(), "SELECT on TABLE D.S.T -> ANALYST");
    }
}
