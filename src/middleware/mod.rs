/*
 * Responsibility
 * - public interface of the middleware layer
 * - claim_header: claim -> destination header; http: transport-level concerns
 */
pub mod claim_header;
pub mod http;
