use document_cookies::{
    CookieStore, DocumentId, InMemoryCookieStore, JsonCookieStore, ScriptCookies,
};

fn main() {
    env_logger::init();

    // Set up a persistent store. All documents share one JSON file; swap in
    // SqliteCookieStore for a database-backed variant, or InMemoryCookieStore
    // for ephemeral cookies.
    let store = JsonCookieStore::new("cookies.json".into());

    // Mint the cookie document. Reusing the same DocumentId across runs hands
    // back the cookies persisted by earlier runs.
    let document_id = DocumentId::from("a9c10c54-2bd7-4a16-8ba2-6ecb2f32b3e5");
    let document = store.document_for(document_id).expect("document");

    // The script-facing helpers work against the ambient document.
    let cookies = ScriptCookies::new(document);

    println!("theme from a previous run: {:?}", cookies.get_cookie("theme"));

    // Set a cookie that expires in 24 hours. The value is percent-encoded,
    // so it may contain separators without corrupting the cookie string.
    cookies.set_cookie("theme", "dark", 24.0);
    cookies.set_cookie("motto", "cookies; the ambient kind", 24.0);

    println!("theme  = {:?}", cookies.get_cookie("theme"));
    println!("motto  = {:?}", cookies.get_cookie("motto"));
    println!("absent = {:?}", cookies.get_cookie("nonexistent"));

    // Deleting writes an already-expired entry; the document evicts it.
    cookies.delete_cookie("motto");
    println!("motto after delete = {:?}", cookies.get_cookie("motto"));

    // Private-mode style usage: an in-memory store, nothing touches disk.
    let private_store = InMemoryCookieStore::new();
    let private = ScriptCookies::new(
        private_store
            .document_for(DocumentId::new())
            .expect("document"),
    );
    private.set_cookie("sid", "abc123", 1.0);
    println!("private sid = {:?}", private.get_cookie("sid"));

    // Flush everything before exiting.
    store.persist_all();
}
