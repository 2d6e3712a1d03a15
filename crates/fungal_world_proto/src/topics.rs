//! Topic naming for world broadcast channels.

pub fn topic_event(world_id: &str) -> String {
    format!("fw.{world_id}.event")
}

pub fn topic_init(world_id: &str) -> String {
    format!("fw.{world_id}.init")
}

pub fn topic_request(world_id: &str) -> String {
    format!("fw.{world_id}.request")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_are_world_scoped() {
        assert_eq!(topic_event("w1"), "fw.w1.event");
        assert_eq!(topic_init("w1"), "fw.w1.init");
        assert_ne!(topic_request("w1"), topic_request("w2"));
    }
}
