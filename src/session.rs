pub(crate) mod repack_session;
