// Public routes (service info, health) need no caller; everything under
// /api/:resource resolves an Actor first and runs it through the permission
// evaluator before touching the database.
pub mod public;
pub mod resources;
