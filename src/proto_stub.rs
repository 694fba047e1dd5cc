pub mod auth {
    pub mod protobuf {
        tonic::include_proto!("auth.protobuf");
    }
}
