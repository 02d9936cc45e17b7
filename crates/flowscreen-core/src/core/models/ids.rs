use slotmap::new_key_type;

new_key_type! {
    pub struct ContextId;
    pub struct UnitId;
    pub struct ReactionId;
}
