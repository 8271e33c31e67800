//! Shared setup for repository tests backed by a temporary SQLite file.

use diesel::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

use crate::db::{self, DbPool, WriteHandle};
use crate::schema::{memberships, organizations};

pub struct TestDb {
    // Held so the directory outlives the pool
    _dir: TempDir,
    pub pool: Arc<DbPool>,
    pub writer: WriteHandle,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ledgerlink.db");
    let path = db::init(path.to_str().expect("utf-8 path")).expect("init db");
    let pool = db::create_pool(&path).expect("create pool");
    db::run_migrations(&pool).expect("run migrations");
    let writer = db::spawn_writer((*pool).clone());
    TestDb {
        _dir: dir,
        pool,
        writer,
    }
}

impl TestDb {
    pub fn insert_organization(&self, id: &str, provider: Option<&str>, api_key: Option<&str>) {
        let mut conn = self.pool.get().expect("connection");
        diesel::insert_into(organizations::table)
            .values((
                organizations::id.eq(id),
                organizations::name.eq(format!("{} Ltd", id)),
                organizations::billing_provider.eq(provider),
                organizations::api_key.eq(api_key),
            ))
            .execute(&mut conn)
            .expect("insert organization");
    }

    pub fn insert_membership(&self, organization_id: &str, user_id: &str, status: &str) {
        let mut conn = self.pool.get().expect("connection");
        diesel::insert_into(memberships::table)
            .values((
                memberships::organization_id.eq(organization_id),
                memberships::user_id.eq(user_id),
                memberships::status.eq(status),
            ))
            .execute(&mut conn)
            .expect("insert membership");
    }
}
