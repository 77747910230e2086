//! Application services. Each one owns its dependencies explicitly; handlers receive
//! them through `web::Data` rather than any global registry.

pub mod auth;
pub mod tasks;

use actix_web::web;

use crate::db::DbPool;

pub use auth::AuthService;
pub use tasks::TaskService;

/// The set of shared services one application instance is built from.
#[derive(Clone)]
pub struct Services {
    pub pool: DbPool,
    pub auth: web::Data<AuthService>,
    pub tasks: web::Data<TaskService>,
}

impl Services {
    pub fn new(pool: DbPool, bcrypt_cost: u32) -> Self {
        Self {
            auth: web::Data::new(AuthService::new(pool.clone(), bcrypt_cost)),
            tasks: web::Data::new(TaskService::new(pool.clone())),
            pool,
        }
    }
}
