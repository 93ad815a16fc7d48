// ==========================================
// 仓储装载跟踪系统 - 应用状态快照仓储
// ==========================================
// 职责: 管理 state_snapshot 表,整棵应用状态按 JSON 快照存取
// 说明: 单行快照,写入即覆盖;读取后执行快照规整
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::state::TrackerState;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SNAPSHOT_KEY: &str = "app_state";

pub struct StateSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StateSnapshotRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保表存在(如果不存在则创建)
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS state_snapshot (
              snapshot_key TEXT PRIMARY KEY,
              payload TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    /// 保存快照(覆盖写)
    pub fn save(&self, state: &TrackerState) -> RepositoryResult<()> {
        let payload = serde_json::to_string(state)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO state_snapshot (snapshot_key, payload, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(snapshot_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
            params![SNAPSHOT_KEY, payload],
        )?;
        debug!(bytes = payload.len(), "应用状态快照已保存");
        Ok(())
    }

    /// 读取快照;不存在时返回 None
    ///
    /// 读取后执行快照规整(种子账户合并、开始时间回填)
    pub fn load(&self) -> RepositoryResult<Option<TrackerState>> {
        let payload = {
            let conn = self.get_conn()?;
            let result = conn.query_row(
                "SELECT payload FROM state_snapshot WHERE snapshot_key = ?1",
                params![SNAPSHOT_KEY],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(p) => p,
                Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        };

        let mut state: TrackerState = serde_json::from_str(&payload)?;
        state.sanitize();
        Ok(Some(state))
    }

    /// 读取快照,不存在时返回种子默认状态
    pub fn load_or_default(&self) -> RepositoryResult<TrackerState> {
        match self.load()? {
            Some(state) => Ok(state),
            None => {
                info!("无历史快照,使用种子默认状态");
                Ok(TrackerState::new())
            }
        }
    }
}
