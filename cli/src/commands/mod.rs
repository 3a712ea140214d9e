mod grocery;
mod helpers;
mod recipe;
mod session;
mod transfer;

pub(crate) use grocery::cmd_grocery;
pub(crate) use recipe::{
    cmd_add, cmd_cuisine, cmd_delete, cmd_edit, cmd_favourite, cmd_list, cmd_random, cmd_rate,
    cmd_show, cmd_stats,
};
pub(crate) use session::{cmd_session_delete, cmd_session_list, cmd_session_show};
pub(crate) use transfer::{cmd_export, cmd_import};
