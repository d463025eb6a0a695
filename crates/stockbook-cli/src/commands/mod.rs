mod init;
mod items;

pub use init::handle_init;
pub use items::{
    handle_add, handle_delete, handle_headers, handle_ids, handle_list, handle_next_id,
    handle_search, handle_sources, handle_update,
};
