use ferrous_forwarder_domain::{Header, Message, ResourceRecord, ResponseCode};

/// Header for a reply to `request`: same ID, opcode and RD bit, RA set.
fn reply_header(request: &Message, response_code: ResponseCode) -> Header {
    Header {
        id: request.header.id,
        response: true,
        opcode: request.header.opcode,
        authoritative: false,
        truncated: false,
        recursion_desired: request.header.recursion_desired,
        recursion_available: true,
        reserved: 0,
        response_code,
    }
}

/// Empty reply carrying only `response_code` and the client's own questions.
pub fn error_response(request: &Message, response_code: ResponseCode) -> Message {
    Message {
        header: reply_header(request, response_code),
        questions: request.questions.clone(),
        answers: vec![],
        authority: vec![],
        additional: vec![],
    }
}

/// Builds the reply one waiter receives. The question keeps the client's
/// original spelling. An OPT advertising `edns_payload_size` is attached only
/// when the client sent one.
pub fn answer_response(
    request: &Message,
    response_code: ResponseCode,
    answers: Vec<ResourceRecord>,
    authority: Vec<ResourceRecord>,
    mut additional: Vec<ResourceRecord>,
    edns_payload_size: u16,
) -> Message {
    additional.retain(|r| !r.is_opt());
    let mut response = Message {
        header: reply_header(request, response_code),
        questions: request.questions.clone(),
        answers,
        authority,
        additional,
    };
    if request.edns_payload_size().is_some() {
        response.set_opt(edns_payload_size);
    }
    response
}

/// FORMERR/NOTIMP for requests the coordinator will not forward.
pub fn reject_reason(request: &Message) -> Option<ResponseCode> {
    if request.header.response || request.questions.is_empty() {
        return Some(ResponseCode::FormErr);
    }
    if request.header.opcode != ferrous_forwarder_domain::Opcode::Query {
        return Some(ResponseCode::NotImp);
    }
    if request.questions.len() > 1 {
        return Some(ResponseCode::FormErr);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrous_forwarder_domain::{Opcode, Question, RecordType};

    fn request() -> Message {
        Message::query(
            99,
            Question::new("WwW.Example.com".parse().unwrap(), RecordType::A),
        )
    }

    #[test]
    fn test_reply_preserves_id_case_and_rd() {
        let mut req = request();
        req.header.recursion_desired = false;
        let response = error_response(&req, ResponseCode::ServFail);

        assert_eq!(response.id(), 99);
        assert!(response.header.response);
        assert!(response.header.recursion_available);
        assert!(!response.header.recursion_desired);
        assert_eq!(response.questions[0].name.to_string(), "WwW.Example.com");
        assert_eq!(response.response_code(), ResponseCode::ServFail);
    }

    #[test]
    fn test_opt_only_for_edns_clients() {
        let plain = answer_response(&request(), ResponseCode::NoError, vec![], vec![], vec![], 1232);
        assert_eq!(plain.edns_payload_size(), None);

        let mut edns = request();
        edns.set_opt(4096);
        let reply = answer_response(&edns, ResponseCode::NoError, vec![], vec![], vec![], 1232);
        assert_eq!(reply.edns_payload_size(), Some(1232));
    }

    #[test]
    fn test_reject_reasons() {
        assert_eq!(reject_reason(&request()), None);

        let mut response = request();
        response.header.response = true;
        assert_eq!(reject_reason(&response), Some(ResponseCode::FormErr));

        let mut empty = request();
        empty.questions.clear();
        assert_eq!(reject_reason(&empty), Some(ResponseCode::FormErr));

        let mut notify = request();
        notify.header.opcode = Opcode::Notify;
        assert_eq!(reject_reason(&notify), Some(ResponseCode::NotImp));

        let mut two = request();
        two.questions.push(two.questions[0].clone());
        assert_eq!(reject_reason(&two), Some(ResponseCode::FormErr));
    }
}
