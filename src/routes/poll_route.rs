use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::controllers::{
    poll_controller::{
        add_poll_option, create_new_poll, delete_poll_by_id, get_all_polls, get_poll_by_id,
        get_poll_result, manage_all_polls, remove_poll_option, rename_poll_option,
        update_poll_by_id,
    },
    vote_controller::{cast_vote, get_my_votes, retract_vote},
};

// identity is resolved by the extractors each handler asks for
pub fn poll_router() -> Router {
    Router::new()
        .route("/", get(get_all_polls).post(create_new_poll))
        .route("/manage", get(manage_all_polls))
        .route(
            "/{poll_id}",
            get(get_poll_by_id)
                .patch(update_poll_by_id)
                .delete(delete_poll_by_id),
        )
        .route("/{poll_id}/options", post(add_poll_option))
        .route(
            "/{poll_id}/options/{option_id}",
            patch(rename_poll_option).delete(remove_poll_option),
        )
        .route("/{poll_id}/vote", post(cast_vote).delete(retract_vote))
        .route("/{poll_id}/votes/me", get(get_my_votes))
        // public
        .route("/{poll_id}/results", get(get_poll_result))
}
