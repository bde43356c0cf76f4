// handlers/mod.rs
//
// root:    GET /, GET /health
// changes: GET /changes, GET /changes/:id, PUT|PATCH /changes/:id (revert)
pub mod changes;
pub mod root;
