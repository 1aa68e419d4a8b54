use tokio::sync::OnceCell;

static ONCE: OnceCell<()> = OnceCell::const_new();

/// Registers the builtin stores, calling it more than once does nothing.
pub async fn setup() {
    ONCE.get_or_init(|| async {
        register_stores();
    })
    .await;
}

#[inline(always)]
fn register_stores() {
    use crate::store::register;

    {
        use crate::store::MemoryStore as Store;
        let name = "memory";
        register(name, |c| Store::try_from(c));
        info!("register store '{}' ok", name);
    }
}
